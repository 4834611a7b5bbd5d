use serde::{Deserialize, Serialize};

use crate::Grant;

/// A managed policy attached to a permission set, with its default-version
/// document embedded as JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedPolicyAttachment {
    /// Identifier of the managed policy.
    pub policy_id: String,
    /// Default-version policy document as JSON text.
    pub document: String,
}

/// Reference to a customer-managed policy attached to a permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerManagedPolicyRef {
    /// Policy name in the owning account.
    pub name: String,
    /// Policy path in the owning account.
    pub path: String,
}

/// Snapshot of one permission set within one authority-instance scope.
///
/// Created once per collection run and superseded, never merged, by the next
/// run under the same `(instance_id, permission_set_id)` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSetRecord {
    /// Authority instance the record is scoped to.
    pub instance_id: String,
    /// Identifier of the permission set within the instance.
    pub permission_set_id: String,
    /// Display name of the permission set.
    pub name: String,
    /// Every account assignment of this permission set, in
    /// account-then-assignment order. Duplicates across accounts are
    /// preserved.
    pub grants: Vec<Grant>,
    /// Attached managed policies with embedded documents.
    pub managed_policies: Vec<ManagedPolicyAttachment>,
    /// Inline policy document as JSON text, empty when none is attached.
    pub inline_policy: String,
    /// References to attached customer-managed policies.
    pub customer_managed_policy_refs: Vec<CustomerManagedPolicyRef>,
    /// Permission boundary reference, empty when no boundary is attached.
    pub permission_boundary: String,
}
