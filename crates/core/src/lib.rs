//! Shared primitives for all Grantlens crates.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Result type used across Grantlens crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not allowed to access a remote resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// One page of items returned by a paginated listing call.
///
/// A present `next_token` means more pages follow; callers repeat the call
/// with the token until it is absent. An empty item list with no token is a
/// valid terminal page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, in service order.
    pub items: Vec<T>,
    /// Continuation token for the next page, absent on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page with an optional continuation token.
    #[must_use]
    pub fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// Creates a terminal page with no continuation token.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Identifier of one authority-service instance.
///
/// Every collected permission-set record is scoped to exactly one instance;
/// the reporter only joins records under the same instance key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    /// Creates a validated instance identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "instance id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for InstanceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of the identity store holding users and groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityStoreId(String);

impl IdentityStoreId {
    /// Creates a validated identity store identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "identity store id must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for IdentityStoreId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
