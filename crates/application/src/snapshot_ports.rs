use async_trait::async_trait;
use grantlens_core::{AppResult, InstanceId, Page};
use grantlens_domain::{PermissionSetRecord, UserRecord};

/// Port for the intermediate store holding the collected snapshots.
///
/// Writes overwrite by key, last writer wins; there is no merge. Scans and
/// queries follow the continuation-token convention.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Writes a permission-set record, replacing any prior record with the
    /// same `(instance_id, permission_set_id)` key.
    async fn put_permission_set(&self, record: PermissionSetRecord) -> AppResult<()>;

    /// Writes a user record, replacing any prior record with the same
    /// `user_id` key.
    async fn put_user(&self, record: UserRecord) -> AppResult<()>;

    /// Scans all stored user records, one page at a time.
    async fn scan_users(&self, page_token: Option<&str>) -> AppResult<Page<UserRecord>>;

    /// Queries permission-set records in one instance scope whose grants
    /// contain the principal id, one page at a time.
    ///
    /// Containment is record-level: a returned record may hold grants for
    /// other principals besides the queried one.
    async fn query_permission_sets_by_principal(
        &self,
        instance_id: &InstanceId,
        principal_id: &str,
        page_token: Option<&str>,
    ) -> AppResult<Page<PermissionSetRecord>>;
}
