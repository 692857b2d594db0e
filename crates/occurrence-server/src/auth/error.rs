use occurrence_core::ErrorBody;

/// Message returned for every authorization failure.
pub const FORBIDDEN_MESSAGE: &str = "Authentication failed or user without permission.";

/// Why a request was rejected. Logged server-side only; never serialized
/// into the response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("malformed Authorization header")]
    MalformedHeader,

    #[error("signing key unavailable: {0}")]
    KeyFetch(String),

    #[error("algorithm {0} not allowed (only RS256)")]
    UnsupportedAlgorithm(String),

    #[error("token validation failed: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    Expired,

    #[error("token carries no realm roles")]
    NoRealmRoles,

    #[error("missing roles: {}", .0.join(", "))]
    MissingRoles(Vec<String>),
}

/// Authorization failure. Always answered with 403 and a generic body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authorization rejected: {reason}")]
pub struct AuthorizationError {
    reason: RejectReason,
}

impl AuthorizationError {
    pub fn new(reason: RejectReason) -> Self {
        Self { reason }
    }

    pub fn reason(&self) -> &RejectReason {
        &self.reason
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new("AuthorizationError", "forbidden", FORBIDDEN_MESSAGE)
    }
}

impl From<RejectReason> for AuthorizationError {
    fn from(reason: RejectReason) -> Self {
        Self::new(reason)
    }
}
