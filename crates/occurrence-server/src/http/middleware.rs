use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, HOST};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

use super::response::ApiError;
use super::AppState;

/// Rejects the request unless the bearer token carries every required realm
/// role. The verified [`crate::auth::AuthContext`] is left in the request
/// extensions for handlers.
pub async fn require_roles(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // A header that is not visible ASCII is treated as malformed, not missing.
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_owned());

    let ctx = state
        .gate
        .authorize(authorization.as_deref(), &state.required_roles)
        .await?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let params = req.uri().query().unwrap_or_default().to_owned();
    // Scoped so nothing borrowing `req` is held across the await below.
    let (request_id, ip, host) = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let host = header(HOST.as_str())
            .map(|h| h.split(':').next().unwrap_or_default().to_owned());
        (header("x-request-id"), header("x-forwarded-for"), host)
    };

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status_code = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        ip = ip.as_deref().unwrap_or("-"),
        host = host.as_deref().unwrap_or("-"),
        params = %params,
        request_id = request_id.as_deref().unwrap_or("-"),
        "request"
    );
    response
}
