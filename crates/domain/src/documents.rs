//! Store-boundary document forms of the domain records.
//!
//! The snapshot store persists records as documents carrying the parallel
//! index-aligned lists of the wire format. Decoding validates list alignment
//! and principal-type values, so a corrupt document surfaces as a validation
//! error at the boundary instead of a wrong report downstream.

use std::str::FromStr;

use grantlens_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{
    CustomerManagedPolicyRef, Grant, GroupMembership, ManagedPolicyAttachment,
    PermissionSetRecord, PrincipalType, UserRecord,
};

/// Persisted form of a [`PermissionSetRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSetDocument {
    /// Authority instance scope key.
    pub instance_id: String,
    /// Permission set record key.
    pub permission_set_id: String,
    /// Display name of the permission set.
    pub permission_set_name: String,
    /// Assigned principal ids, index-aligned with the other grant lists.
    pub principal_ids: Vec<String>,
    /// Principal type storage values, index-aligned with `principal_ids`.
    pub principal_types: Vec<String>,
    /// Assigned account ids, index-aligned with `principal_ids`.
    pub account_ids: Vec<String>,
    /// Attached managed policies with embedded documents.
    pub managed_policies: Vec<ManagedPolicyAttachment>,
    /// Inline policy document as JSON text.
    pub inline_policy: String,
    /// References to attached customer-managed policies.
    pub customer_managed_policy_refs: Vec<CustomerManagedPolicyRef>,
    /// Permission boundary reference, empty when none.
    pub permission_boundary: String,
}

impl From<PermissionSetRecord> for PermissionSetDocument {
    fn from(record: PermissionSetRecord) -> Self {
        let mut principal_ids = Vec::with_capacity(record.grants.len());
        let mut principal_types = Vec::with_capacity(record.grants.len());
        let mut account_ids = Vec::with_capacity(record.grants.len());
        for grant in record.grants {
            principal_ids.push(grant.principal_id);
            principal_types.push(grant.principal_type.as_str().to_owned());
            account_ids.push(grant.account_id);
        }

        Self {
            instance_id: record.instance_id,
            permission_set_id: record.permission_set_id,
            permission_set_name: record.name,
            principal_ids,
            principal_types,
            account_ids,
            managed_policies: record.managed_policies,
            inline_policy: record.inline_policy,
            customer_managed_policy_refs: record.customer_managed_policy_refs,
            permission_boundary: record.permission_boundary,
        }
    }
}

impl TryFrom<PermissionSetDocument> for PermissionSetRecord {
    type Error = AppError;

    fn try_from(document: PermissionSetDocument) -> AppResult<Self> {
        if document.principal_ids.len() != document.principal_types.len()
            || document.principal_ids.len() != document.account_ids.len()
        {
            return Err(AppError::Validation(format!(
                "misaligned grant lists in permission set '{}': {} principal ids, {} principal types, {} account ids",
                document.permission_set_id,
                document.principal_ids.len(),
                document.principal_types.len(),
                document.account_ids.len()
            )));
        }

        let mut grants = Vec::with_capacity(document.principal_ids.len());
        for ((principal_id, principal_type), account_id) in document
            .principal_ids
            .into_iter()
            .zip(document.principal_types)
            .zip(document.account_ids)
        {
            grants.push(Grant {
                principal_id,
                principal_type: PrincipalType::from_str(principal_type.as_str())?,
                account_id,
            });
        }

        Ok(Self {
            instance_id: document.instance_id,
            permission_set_id: document.permission_set_id,
            name: document.permission_set_name,
            grants,
            managed_policies: document.managed_policies,
            inline_policy: document.inline_policy,
            customer_managed_policy_refs: document.customer_managed_policy_refs,
            permission_boundary: document.permission_boundary,
        })
    }
}

/// Persisted form of a [`UserRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    /// User record key.
    pub user_id: String,
    /// Sign-in name of the user.
    pub user_name: String,
    /// Group ids the user belongs to, index-aligned with `group_names`.
    pub group_ids: Vec<String>,
    /// Group display names, index-aligned with `group_ids`.
    pub group_names: Vec<String>,
}

impl From<UserRecord> for UserDocument {
    fn from(record: UserRecord) -> Self {
        let mut group_ids = Vec::with_capacity(record.memberships.len());
        let mut group_names = Vec::with_capacity(record.memberships.len());
        for membership in record.memberships {
            group_ids.push(membership.group_id);
            group_names.push(membership.group_name);
        }

        Self {
            user_id: record.user_id,
            user_name: record.user_name,
            group_ids,
            group_names,
        }
    }
}

impl TryFrom<UserDocument> for UserRecord {
    type Error = AppError;

    fn try_from(document: UserDocument) -> AppResult<Self> {
        if document.group_ids.len() != document.group_names.len() {
            return Err(AppError::Validation(format!(
                "misaligned membership lists for user '{}': {} group ids, {} group names",
                document.user_id,
                document.group_ids.len(),
                document.group_names.len()
            )));
        }

        let memberships = document
            .group_ids
            .into_iter()
            .zip(document.group_names)
            .map(|(group_id, group_name)| GroupMembership {
                group_id,
                group_name,
            })
            .collect();

        Ok(Self {
            user_id: document.user_id,
            user_name: document.user_name,
            memberships,
        })
    }
}
