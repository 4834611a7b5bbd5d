use grantlens_core::{AppResult, IdentityStoreId};
use grantlens_domain::{GroupMembership, UserRecord};
use tracing::debug;

use super::CollectorService;

impl CollectorService {
    pub(super) async fn collect_users_impl(
        &self,
        identity_store_id: &IdentityStoreId,
    ) -> AppResult<Vec<UserRecord>> {
        let mut page = self.identity.list_users(identity_store_id, None).await?;
        let mut users = page.items;
        while let Some(token) = page.next_token {
            page = self
                .identity
                .list_users(identity_store_id, Some(token.as_str()))
                .await?;
            users.extend(page.items);
        }

        debug!(
            identity_store_id = %identity_store_id,
            count = users.len(),
            "collecting users"
        );

        let mut records = Vec::with_capacity(users.len());
        for user in users {
            let memberships = self
                .collect_memberships(identity_store_id, user.user_id.as_str())
                .await?;
            let record = UserRecord {
                user_id: user.user_id,
                user_name: user.user_name,
                memberships,
            };
            self.store.put_user(record.clone()).await?;
            records.push(record);
        }

        Ok(records)
    }

    /// Collects a user's group memberships and resolves each group's display
    /// name. A user with no memberships yields an empty list, not an error.
    async fn collect_memberships(
        &self,
        identity_store_id: &IdentityStoreId,
        user_id: &str,
    ) -> AppResult<Vec<GroupMembership>> {
        let mut page = self
            .identity
            .list_group_memberships(identity_store_id, user_id, None)
            .await?;
        let mut group_ids = page.items;
        while let Some(token) = page.next_token {
            page = self
                .identity
                .list_group_memberships(identity_store_id, user_id, Some(token.as_str()))
                .await?;
            group_ids.extend(page.items);
        }

        let mut memberships = Vec::with_capacity(group_ids.len());
        for group_id in group_ids {
            let group_name = self
                .identity
                .describe_group(identity_store_id, group_id.as_str())
                .await?;
            memberships.push(GroupMembership {
                group_id,
                group_name,
            });
        }

        Ok(memberships)
    }
}
