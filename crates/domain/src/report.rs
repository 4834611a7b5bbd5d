use crate::PrincipalType;

/// Sentinel account value marking an identity with no permission-set grant.
pub const NOT_ASSIGNED: &str = "not_assigned";

/// Maximum character count a serialized policy field may occupy in a report
/// cell. Chosen to stay under the 32,767-character cell limit of common
/// spreadsheet tools.
pub const REPORT_FIELD_CHAR_LIMIT: usize = 32_700;

/// Replacement value for a policy field exceeding [`REPORT_FIELD_CHAR_LIMIT`].
pub const FIELD_LIMIT_NOTICE: &str =
    "Value exceeds the report cell character limit, consult the authority service for the full policy";

/// Fixed header row of the report file.
pub const REPORT_HEADER: [&str; 11] = [
    "User",
    "PrincipalId",
    "PrincipalType",
    "GroupName",
    "AccountIdAssignment",
    "PermissionSetId",
    "PermissionSetName",
    "InlinePolicy",
    "CustomerManagedPolicy",
    "ManagedPolicy",
    "PermissionBoundary",
];

/// Replaces a serialized policy field with the fixed notice when it exceeds
/// the report cell limit. Values of exactly the limit pass through.
#[must_use]
pub fn guard_field_size(value: String) -> String {
    if value.chars().count() > REPORT_FIELD_CHAR_LIMIT {
        FIELD_LIMIT_NOTICE.to_owned()
    } else {
        value
    }
}

/// One flattened entitlement row of the report. Derived during reporting,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Sign-in name of the user the row belongs to.
    pub user_name: String,
    /// The user's own id for a direct grant, the group's id for an inherited
    /// grant.
    pub principal_id: String,
    /// Principal type of the grant the row was derived from.
    pub principal_type: PrincipalType,
    /// Group display name for inherited grants, empty for direct grants.
    pub group_name: String,
    /// Assigned account, or [`NOT_ASSIGNED`] for the sentinel row.
    pub account_id: String,
    /// Identifier of the granting permission set, empty on sentinel rows.
    pub permission_set_id: String,
    /// Display name of the granting permission set, empty on sentinel rows.
    pub permission_set_name: String,
    /// Inline policy document, size-guarded.
    pub inline_policy: String,
    /// Serialized customer-managed policy references, size-guarded.
    pub customer_policies: String,
    /// Serialized managed-policy id list, size-guarded.
    pub managed_policies: String,
    /// Permission boundary reference, empty when none.
    pub permission_boundary: String,
}

impl ReportRow {
    /// Returns the row's cells in [`REPORT_HEADER`] order.
    #[must_use]
    pub fn cells(&self) -> [&str; 11] {
        [
            self.user_name.as_str(),
            self.principal_id.as_str(),
            self.principal_type.as_str(),
            self.group_name.as_str(),
            self.account_id.as_str(),
            self.permission_set_id.as_str(),
            self.permission_set_name.as_str(),
            self.inline_policy.as_str(),
            self.customer_policies.as_str(),
            self.managed_policies.as_str(),
            self.permission_boundary.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{FIELD_LIMIT_NOTICE, REPORT_FIELD_CHAR_LIMIT, guard_field_size};

    #[test]
    fn value_below_limit_passes_through() {
        let value = "a".repeat(REPORT_FIELD_CHAR_LIMIT - 1);
        assert_eq!(guard_field_size(value.clone()), value);
    }

    #[test]
    fn value_at_limit_passes_through() {
        let value = "a".repeat(REPORT_FIELD_CHAR_LIMIT);
        assert_eq!(guard_field_size(value.clone()), value);
    }

    #[test]
    fn value_above_limit_is_replaced_by_notice() {
        let value = "a".repeat(REPORT_FIELD_CHAR_LIMIT + 1);
        assert_eq!(guard_field_size(value), FIELD_LIMIT_NOTICE);
    }
}
