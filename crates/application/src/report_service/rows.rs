//! The per-user join of the identity snapshot against the permission-set
//! snapshot.

use grantlens_core::{AppError, AppResult, InstanceId};
use grantlens_domain::{
    NOT_ASSIGNED, PermissionSetRecord, PrincipalType, ReportRow, UserRecord, guard_field_size,
};

use super::ReportService;

/// One identity to resolve for a user: the user itself, or one of the groups
/// it belongs to.
struct ReportIdentity {
    principal_id: String,
    principal_type: PrincipalType,
    group_name: String,
}

impl ReportService {
    /// Appends every entitlement row for one user: the direct identity
    /// first, then each group membership in stored order.
    pub(super) async fn append_user_rows(
        &self,
        instance_id: &InstanceId,
        user: &UserRecord,
        report_rows: &mut Vec<ReportRow>,
    ) -> AppResult<()> {
        for identity in identities_to_check(user) {
            let records = self
                .query_permission_sets(instance_id, identity.principal_id.as_str())
                .await?;

            if records.is_empty() {
                report_rows.push(not_assigned_row(user, &identity));
                continue;
            }

            for record in &records {
                append_grant_rows(user, &identity, record, report_rows)?;
            }
        }

        Ok(())
    }

    async fn query_permission_sets(
        &self,
        instance_id: &InstanceId,
        principal_id: &str,
    ) -> AppResult<Vec<PermissionSetRecord>> {
        let mut page = self
            .store
            .query_permission_sets_by_principal(instance_id, principal_id, None)
            .await?;
        let mut records = page.items;
        while let Some(token) = page.next_token {
            page = self
                .store
                .query_permission_sets_by_principal(instance_id, principal_id, Some(token.as_str()))
                .await?;
            records.extend(page.items);
        }

        Ok(records)
    }
}

fn identities_to_check(user: &UserRecord) -> Vec<ReportIdentity> {
    let mut identities = Vec::with_capacity(user.memberships.len() + 1);
    identities.push(ReportIdentity {
        principal_id: user.user_id.clone(),
        principal_type: PrincipalType::User,
        group_name: String::new(),
    });
    for membership in &user.memberships {
        identities.push(ReportIdentity {
            principal_id: membership.group_id.clone(),
            principal_type: PrincipalType::Group,
            group_name: membership.group_name.clone(),
        });
    }

    identities
}

/// Sentinel row for an identity holding no permission-set grant at all.
fn not_assigned_row(user: &UserRecord, identity: &ReportIdentity) -> ReportRow {
    ReportRow {
        user_name: user.user_name.clone(),
        principal_id: identity.principal_id.clone(),
        principal_type: identity.principal_type,
        group_name: identity.group_name.clone(),
        account_id: NOT_ASSIGNED.to_owned(),
        permission_set_id: String::new(),
        permission_set_name: String::new(),
        inline_policy: String::new(),
        customer_policies: String::new(),
        managed_policies: String::new(),
        permission_boundary: String::new(),
    }
}

/// Appends one row per grant in the record whose principal id equals the
/// identity's.
///
/// The containment query can match a record through a different principal in
/// the same grant list, so the per-grant equality check is mandatory: without
/// it the report would claim accounts granted to other principals.
fn append_grant_rows(
    user: &UserRecord,
    identity: &ReportIdentity,
    record: &PermissionSetRecord,
    report_rows: &mut Vec<ReportRow>,
) -> AppResult<()> {
    let managed_policy_ids: Vec<&str> = record
        .managed_policies
        .iter()
        .map(|policy| policy.policy_id.as_str())
        .collect();
    let managed_policies = guard_field_size(serialize_field(&managed_policy_ids)?);
    let customer_policies = guard_field_size(serialize_field(&record.customer_managed_policy_refs)?);
    let inline_policy = guard_field_size(record.inline_policy.clone());

    for grant in &record.grants {
        if grant.principal_id != identity.principal_id {
            continue;
        }

        report_rows.push(ReportRow {
            user_name: user.user_name.clone(),
            principal_id: identity.principal_id.clone(),
            principal_type: grant.principal_type,
            group_name: identity.group_name.clone(),
            account_id: grant.account_id.clone(),
            permission_set_id: record.permission_set_id.clone(),
            permission_set_name: record.name.clone(),
            inline_policy: inline_policy.clone(),
            customer_policies: customer_policies.clone(),
            managed_policies: managed_policies.clone(),
            permission_boundary: record.permission_boundary.clone(),
        });
    }

    Ok(())
}

fn serialize_field<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value)
        .map_err(|error| AppError::Internal(format!("failed to serialize report field: {error}")))
}
