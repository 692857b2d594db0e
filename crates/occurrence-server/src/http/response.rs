use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use occurrence_core::{ErrorBody, StoreError};

use crate::auth::AuthorizationError;

/// Everything a handler or middleware stage can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid record id: {0}")]
    InvalidId(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_body(err: impl ToString) -> Self {
        Self::InvalidBody(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::BusinessRule { .. }) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            Self::Store(err) => err.to_body(),
            Self::Unauthorized(err) => err.to_body(),
            Self::InvalidBody(details) => {
                ErrorBody::new("ValidationError", details.as_str(), "Invalid request body.")
            }
            Self::InvalidId(details) => {
                ErrorBody::new("ValidationError", details.as_str(), "Invalid record id.")
            }
            Self::Internal(details) => {
                ErrorBody::new("InternalError", details.as_str(), "Internal server error.")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
