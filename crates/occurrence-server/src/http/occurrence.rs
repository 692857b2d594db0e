use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use occurrence_core::{
    Entity, Fetched, FieldMap, Occurrence, RecordStore, Session, StoreError,
};
use serde::Deserialize;
use serde_json::Value;

use super::extract::RecordIdPath;
use super::payload::{CreateOccurrence, Payload, UpdateOccurrence};
use super::response::ApiError;
use super::AppState;
use crate::auth::AuthContext;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(alias = "typeTag")]
    pub type_tag: Option<String>,
}

/// Runs store work on the blocking pool with a fresh session.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Session<'_>, &RecordStore<Occurrence>) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    let store = state.occurrences.clone();
    tokio::task::spawn_blocking(move || {
        let session = db.session();
        op(&session, &store)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?
}

fn subject(ctx: &AuthContext) -> &str {
    ctx.username
        .as_deref()
        .or(ctx.subject.as_deref())
        .unwrap_or("-")
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let type_tag = query.type_tag.filter(|tag| !tag.is_empty());
    tracing::debug!(type_tag = type_tag.as_deref(), "listing occurrences");
    with_store(&state, move |session, store| {
        let records = match type_tag {
            Some(tag) => {
                let mut filter = FieldMap::new();
                filter.insert("type_tag".into(), Value::String(tag));
                store.get_group(session, &filter)?
            }
            None => store.get_all(session)?,
        };
        Ok(store.project_all(&records)?)
    })
    .await
    .map(Json)
}

pub async fn fetch(
    State(state): State<AppState>,
    RecordIdPath(id): RecordIdPath,
) -> Result<Json<Value>, ApiError> {
    with_store(&state, move |session, store| match store.get(session, Some(id))? {
        Fetched::NotFound => Err(StoreError::business_rule(
            "id not found.",
            format!("Failed to get id {id} from {}.", Occurrence::NAME),
        )
        .into()),
        found => Ok(found.to_json(store)?),
    })
    .await
    .map(Json)
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let fields = CreateOccurrence::parse(&body)?.into_fields()?;
    let (id, json) = with_store(&state, move |session, store| {
        let created = store.create(session, &fields)?;
        Ok((created.id, store.project(&created)?))
    })
    .await?;
    tracing::info!(id, by = subject(&ctx), "occurrence created");
    Ok((StatusCode::CREATED, Json(json)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    RecordIdPath(id): RecordIdPath,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = UpdateOccurrence::parse(&body)?.into_fields()?;
    let json = with_store(&state, move |session, store| {
        let updated = store.update(session, id, &fields)?;
        Ok(store.project(&updated)?)
    })
    .await?;
    tracing::info!(id, by = subject(&ctx), "occurrence updated");
    Ok(Json(json))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    RecordIdPath(id): RecordIdPath,
) -> Result<Json<Value>, ApiError> {
    let json = with_store(&state, move |session, store| {
        let deleted = store.delete(session, id)?;
        Ok(store.project(&deleted)?)
    })
    .await?;
    tracing::info!(id, by = subject(&ctx), "occurrence deleted");
    Ok(Json(json))
}
