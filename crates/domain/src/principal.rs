use std::str::FromStr;

use grantlens_core::AppError;
use serde::{Deserialize, Serialize};

/// Kind of identity a permission set can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipalType {
    /// A single identity-store user.
    User,
    /// An identity-store group; members inherit the grant.
    Group,
}

impl PrincipalType {
    /// Returns the stable storage value for this principal type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Group => "GROUP",
        }
    }
}

impl FromStr for PrincipalType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "USER" => Ok(Self::User),
            "GROUP" => Ok(Self::Group),
            _ => Err(AppError::Validation(format!(
                "unknown principal type '{value}'"
            ))),
        }
    }
}

/// One account assignment of a permission set to a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Identifier of the assigned user or group.
    pub principal_id: String,
    /// Whether the principal is a user or a group.
    pub principal_type: PrincipalType,
    /// Account the permission set is provisioned into for this principal.
    pub account_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_type_round_trips_through_storage_value() {
        for principal_type in [PrincipalType::User, PrincipalType::Group] {
            let parsed = principal_type
                .as_str()
                .parse::<PrincipalType>()
                .unwrap_or_else(|error| panic!("storage value failed to parse: {error}"));
            assert_eq!(parsed, principal_type);
        }
    }

    #[test]
    fn unknown_principal_type_is_rejected() {
        assert!("MACHINE".parse::<PrincipalType>().is_err());
    }
}
