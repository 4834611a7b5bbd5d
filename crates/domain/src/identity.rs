/// One group a user belongs to, with the resolved display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    /// Identifier of the group in the identity store.
    pub group_id: String,
    /// Display name of the group.
    pub group_name: String,
}

/// Snapshot of one identity-store user and their group memberships.
///
/// Created once per collection run and superseded by the next run under the
/// same `user_id` key. Group memberships are lookup-only references into the
/// principal ids appearing in permission-set grants; no group entity is
/// stored beyond its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Identifier of the user in the identity store.
    pub user_id: String,
    /// Sign-in name of the user.
    pub user_name: String,
    /// Groups the user belongs to, in identity-store order.
    pub memberships: Vec<GroupMembership>,
}
