use grantlens_core::{AppError, AppResult, InstanceId};
use grantlens_domain::{Grant, ManagedPolicyAttachment, PermissionSetRecord};
use tracing::debug;

use super::CollectorService;

impl CollectorService {
    pub(super) async fn collect_permission_sets_impl(
        &self,
        instance_id: &InstanceId,
    ) -> AppResult<Vec<PermissionSetRecord>> {
        let mut page = self.authority.list_permission_sets(instance_id, None).await?;
        let mut permission_set_ids = page.items;
        while let Some(token) = page.next_token {
            page = self
                .authority
                .list_permission_sets(instance_id, Some(token.as_str()))
                .await?;
            permission_set_ids.extend(page.items);
        }

        debug!(
            instance_id = %instance_id,
            count = permission_set_ids.len(),
            "collecting permission sets"
        );

        let mut records = Vec::with_capacity(permission_set_ids.len());
        for permission_set_id in &permission_set_ids {
            let record = self
                .build_permission_set_record(instance_id, permission_set_id.as_str())
                .await?;
            self.store.put_permission_set(record.clone()).await?;
            records.push(record);
        }

        Ok(records)
    }

    async fn build_permission_set_record(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<PermissionSetRecord> {
        let description = self
            .authority
            .describe_permission_set(instance_id, permission_set_id)
            .await?;
        let grants = self.collect_grants(instance_id, permission_set_id).await?;
        let managed_policies = self
            .resolve_managed_policies(instance_id, permission_set_id)
            .await?;
        let inline_policy = self
            .authority
            .get_inline_policy(instance_id, permission_set_id)
            .await?;
        let customer_managed_policy_refs = self
            .authority
            .list_customer_managed_policy_refs(instance_id, permission_set_id)
            .await?;

        // A missing boundary is the one expected lookup failure; every other
        // error aborts the run.
        let permission_boundary = match self
            .authority
            .get_permission_boundary(instance_id, permission_set_id)
            .await
        {
            Ok(reference) => reference,
            Err(AppError::NotFound(_)) => String::new(),
            Err(error) => return Err(error),
        };

        Ok(PermissionSetRecord {
            instance_id: instance_id.as_str().to_owned(),
            permission_set_id: permission_set_id.to_owned(),
            name: description.name,
            grants,
            managed_policies,
            inline_policy,
            customer_managed_policy_refs,
            permission_boundary,
        })
    }

    /// Collects every account assignment of one permission set.
    ///
    /// Account pagination is exhausted before the per-account assignment
    /// lookups, and every assignment item on every page is accumulated.
    /// Order is account-then-assignment; duplicates across accounts are
    /// preserved.
    async fn collect_grants(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<Vec<Grant>> {
        let mut page = self
            .authority
            .list_associated_accounts(instance_id, permission_set_id, None)
            .await?;
        let mut account_ids = page.items;
        while let Some(token) = page.next_token {
            page = self
                .authority
                .list_associated_accounts(instance_id, permission_set_id, Some(token.as_str()))
                .await?;
            account_ids.extend(page.items);
        }

        let mut grants = Vec::new();
        for account_id in &account_ids {
            let mut page = self
                .authority
                .list_account_assignments(instance_id, permission_set_id, account_id.as_str(), None)
                .await?;
            let mut assignments = page.items;
            while let Some(token) = page.next_token {
                page = self
                    .authority
                    .list_account_assignments(
                        instance_id,
                        permission_set_id,
                        account_id.as_str(),
                        Some(token.as_str()),
                    )
                    .await?;
                assignments.extend(page.items);
            }

            for assignment in assignments {
                grants.push(Grant {
                    principal_id: assignment.principal_id,
                    principal_type: assignment.principal_type,
                    account_id: assignment.account_id,
                });
            }
        }

        Ok(grants)
    }

    async fn resolve_managed_policies(
        &self,
        instance_id: &InstanceId,
        permission_set_id: &str,
    ) -> AppResult<Vec<ManagedPolicyAttachment>> {
        let attached = self
            .authority
            .list_attached_managed_policies(instance_id, permission_set_id)
            .await?;

        let mut managed_policies = Vec::with_capacity(attached.len());
        for policy in attached {
            let version_id = self
                .policies
                .default_policy_version(policy.policy_id.as_str())
                .await?;
            let document = self
                .policies
                .policy_document(policy.policy_id.as_str(), version_id.as_str())
                .await?;
            managed_policies.push(ManagedPolicyAttachment {
                policy_id: policy.policy_id,
                document: document.to_string(),
            });
        }

        Ok(managed_policies)
    }
}
