use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use occurrence_core::RecordId;

use super::response::ApiError;

/// `{id}` path segment parsed as a [`RecordId`]. Anything else is rejected
/// with an [`ApiError`] body instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIdPath(pub RecordId);

#[async_trait]
impl<S> FromRequestParts<S> for RecordIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::InvalidId(e.body_text()))?;
        raw.parse::<RecordId>()
            .map(Self)
            .map_err(|e| ApiError::InvalidId(format!("{raw:?} is not a record id: {e}")))
    }
}
