use std::sync::Arc;

use grantlens_core::{AppResult, IdentityStoreId, InstanceId};
use grantlens_domain::{PermissionSetRecord, UserRecord};
use tracing::info;

use crate::{AuthorityClient, IdentityDirectoryClient, PolicyResolver, SnapshotStore};

mod permission_sets;
#[cfg(test)]
mod tests;
mod users;

/// Counts produced by one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Number of permission-set records written.
    pub permission_sets: usize,
    /// Number of user records written.
    pub users: usize,
}

/// Application service producing a complete snapshot of the permission and
/// identity graphs for one authority-instance scope.
#[derive(Clone)]
pub struct CollectorService {
    authority: Arc<dyn AuthorityClient>,
    policies: Arc<dyn PolicyResolver>,
    identity: Arc<dyn IdentityDirectoryClient>,
    store: Arc<dyn SnapshotStore>,
}

impl CollectorService {
    /// Creates a collector from the injected client and store ports.
    #[must_use]
    pub fn new(
        authority: Arc<dyn AuthorityClient>,
        policies: Arc<dyn PolicyResolver>,
        identity: Arc<dyn IdentityDirectoryClient>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            authority,
            policies,
            identity,
            store,
        }
    }

    /// Collects both snapshots and writes them into the store.
    ///
    /// The two collections are independent; this runs the permission graph
    /// first, then the identity graph. Any non-suppressed error aborts the
    /// run, leaving whatever partial snapshot was already written.
    pub async fn run_collection(
        &self,
        instance_id: &InstanceId,
        identity_store_id: &IdentityStoreId,
    ) -> AppResult<CollectionSummary> {
        let permission_sets = self.collect_permission_sets(instance_id).await?;
        let users = self.collect_users(identity_store_id).await?;

        let summary = CollectionSummary {
            permission_sets: permission_sets.len(),
            users: users.len(),
        };
        info!(
            instance_id = %instance_id,
            identity_store_id = %identity_store_id,
            permission_sets = summary.permission_sets,
            users = summary.users,
            "collection run completed"
        );

        Ok(summary)
    }

    /// Collects every permission-set record for the instance, writing each
    /// into the store as it is assembled.
    pub async fn collect_permission_sets(
        &self,
        instance_id: &InstanceId,
    ) -> AppResult<Vec<PermissionSetRecord>> {
        self.collect_permission_sets_impl(instance_id).await
    }

    /// Collects every user record in the identity store, writing each as it
    /// is assembled.
    pub async fn collect_users(
        &self,
        identity_store_id: &IdentityStoreId,
    ) -> AppResult<Vec<UserRecord>> {
        self.collect_users_impl(identity_store_id).await
    }
}
