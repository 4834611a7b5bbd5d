//! Domain records and invariants for the access audit pipeline.

#![forbid(unsafe_code)]

mod documents;
mod identity;
mod permission_set;
mod principal;
mod report;

pub use documents::{PermissionSetDocument, UserDocument};
pub use identity::{GroupMembership, UserRecord};
pub use permission_set::{CustomerManagedPolicyRef, ManagedPolicyAttachment, PermissionSetRecord};
pub use principal::{Grant, PrincipalType};
pub use report::{
    FIELD_LIMIT_NOTICE, NOT_ASSIGNED, REPORT_FIELD_CHAR_LIMIT, REPORT_HEADER, ReportRow,
    guard_field_size,
};
