//! Store error types.
//!
//! Errors are values at the boundary between the store and its callers:
//! every operation returns a [`StoreResult`] and the HTTP layer branches on
//! the variant. [`ErrorBody`] is the wire shape sent back to clients.

use serde::{Deserialize, Serialize};

/// Failures surfaced by the record store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The underlying storage operation failed (connectivity, constraint
    /// violation, rejected write). Mutations are rolled back before this is
    /// returned.
    #[error("{message} ({details})")]
    Persistence { message: String, details: String },

    /// A precondition failed, e.g. the identifier does not exist. No write
    /// was attempted.
    #[error("{message} ({details})")]
    BusinessRule { message: String, details: String },

    /// A record could not be projected to JSON.
    #[error("{message} ({details})")]
    Serialization { message: String, details: String },
}

impl StoreError {
    pub fn persistence(message: impl Into<String>, details: impl ToString) -> Self {
        Self::Persistence {
            message: message.into(),
            details: details.to_string(),
        }
    }

    pub fn business_rule(message: impl Into<String>, details: impl ToString) -> Self {
        Self::BusinessRule {
            message: message.into(),
            details: details.to_string(),
        }
    }

    pub fn serialization(message: impl Into<String>, details: impl ToString) -> Self {
        Self::Serialization {
            message: message.into(),
            details: details.to_string(),
        }
    }

    /// Stable type name, reported as `type` in [`ErrorBody`].
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Persistence { .. } => "PersistenceError",
            Self::BusinessRule { .. } => "BusinessRuleError",
            Self::Serialization { .. } => "SerializationError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Persistence { message, .. }
            | Self::BusinessRule { message, .. }
            | Self::Serialization { message, .. } => message,
        }
    }

    pub fn details(&self) -> &str {
        match self {
            Self::Persistence { details, .. }
            | Self::BusinessRule { details, .. }
            | Self::Serialization { details, .. } => details,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BusinessRule { .. })
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.kind(), self.details(), self.message())
    }
}

/// `{type, details, message}` as returned to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(
        kind: impl Into<String>,
        details: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            details: details.into(),
            message: message.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
