//! HTTP surface.
//!
//! `/occurrence` routes sit behind [`middleware::require_roles`]; `/healthz`
//! is open. Every request passes through [`middleware::log_requests`].

pub mod extract;
pub mod middleware;
pub mod occurrence;
pub mod payload;
pub mod response;

use axum::routing::get;
use axum::{Json, Router};
use occurrence_core::{Database, Occurrence, RecordStore};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::{AuthGate, RequiredRoles};

pub use response::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub occurrences: RecordStore<Occurrence>,
    pub gate: Arc<AuthGate>,
    pub required_roles: Arc<RequiredRoles>,
}

impl AppState {
    pub fn new(
        db: Database,
        occurrences: RecordStore<Occurrence>,
        gate: AuthGate,
        required_roles: RequiredRoles,
    ) -> Self {
        Self {
            db,
            occurrences,
            gate: Arc::new(gate),
            required_roles: Arc::new(required_roles),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let occurrences = Router::new()
        .route("/occurrence", get(occurrence::list).post(occurrence::create))
        .route("/occurrence/", get(occurrence::list).post(occurrence::create))
        .route(
            "/occurrence/:id",
            get(occurrence::fetch)
                .put(occurrence::update)
                .delete(occurrence::remove),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_roles,
        ));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(occurrences)
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
