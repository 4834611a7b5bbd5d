//! Ports for the remote services the collector reads from.
//!
//! Every listing call follows the continuation-token convention: a returned
//! [`Page`] with a present `next_token` has more pages; callers repeat the
//! call with the token until it is absent.

use async_trait::async_trait;
use grantlens_core::{AppResult, IdentityStoreId, InstanceId, Page};
use grantlens_domain::{CustomerManagedPolicyRef, PrincipalType};
use serde_json::Value;

/// Display metadata of one permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSetDescription {
    /// Display name of the permission set.
    pub name: String,
}

/// One account assignment returned by the authority service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAssignment {
    /// Identifier of the assigned user or group.
    pub principal_id: String,
    /// Whether the principal is a user or a group.
    pub principal_type: PrincipalType,
    /// Account the assignment belongs to, as reported by the service.
    pub account_id: String,
}

/// One managed policy attached to a permission set, before document
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedManagedPolicy {
    /// Identifier of the attached policy.
    pub policy_id: String,
}

/// Client port for the authority service holding the permission-set graph.
#[async_trait]
pub trait AuthorityClient: Send + Sync {
    /// Lists permission set ids for an instance, one page at a time.
    async fn list_permission_sets(
        &self,
        instance_id: &InstanceId,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>>;

    /// Returns display metadata for one permission set.
    async fn describe_permission_set(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<PermissionSetDescription>;

    /// Lists accounts the permission set is provisioned into, one page at a
    /// time.
    async fn list_associated_accounts(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>>;

    /// Lists principal assignments of the permission set in one account, one
    /// page at a time.
    async fn list_account_assignments(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
        account_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<AccountAssignment>>;

    /// Lists managed policies attached to the permission set.
    async fn list_attached_managed_policies(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<Vec<AttachedManagedPolicy>>;

    /// Returns the inline policy document as JSON text, empty when none is
    /// attached.
    async fn get_inline_policy(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<String>;

    /// Lists customer-managed policy references attached to the permission
    /// set.
    async fn list_customer_managed_policy_refs(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<Vec<CustomerManagedPolicyRef>>;

    /// Returns the permission boundary reference of the permission set.
    ///
    /// A permission set without a boundary is reported as
    /// [`grantlens_core::AppError::NotFound`]; the collector maps that case
    /// to an empty boundary.
    async fn get_permission_boundary(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<String>;
}

/// Client port resolving managed-policy documents.
#[async_trait]
pub trait PolicyResolver: Send + Sync {
    /// Returns the default version id of a managed policy.
    async fn default_policy_version(&self, policy_id: &str) -> AppResult<String>;

    /// Returns the document of one policy version.
    async fn policy_document(&self, policy_id: &str, version_id: &str) -> AppResult<Value>;
}

/// One user returned by the identity service listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    /// Identifier of the user in the identity store.
    pub user_id: String,
    /// Sign-in name of the user.
    pub user_name: String,
}

/// Client port for the identity service holding users and groups.
#[async_trait]
pub trait IdentityDirectoryClient: Send + Sync {
    /// Lists users in the identity store, one page at a time.
    async fn list_users(
        &self,
        identity_store_id: &IdentityStoreId,
        page_token: Option<&str>,
    ) -> AppResult<Page<DirectoryUser>>;

    /// Lists group ids a user belongs to, one page at a time.
    async fn list_group_memberships(
        &self,
        identity_store_id: &IdentityStoreId,
        user_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<String>>;

    /// Returns the display name of one group.
    async fn describe_group(
        &self,
        identity_store_id: &IdentityStoreId,
        group_id: &str,
    ) -> AppResult<String>;
}
