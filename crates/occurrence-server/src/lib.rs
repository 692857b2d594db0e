//! Occurrence HTTP API.
//!
//! - [`auth`]: bearer token verification against realm signing keys and
//!   realm-role checks
//! - [`http`]: axum router, middleware and handlers
//! - [`config`]: command line and environment configuration

pub mod auth;
pub mod config;
pub mod http;
pub mod telemetry;

use anyhow::Context;
use occurrence_core::{Database, RecordStore};

use crate::auth::AuthGate;
use crate::config::Cli;
use crate::http::AppState;

/// Opens the database and builds the gate described by `cli`.
pub fn build_state(cli: &Cli) -> anyhow::Result<AppState> {
    let db = match &cli.database {
        Some(path) => Database::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?,
        None => {
            tracing::warn!("no database file configured, records are kept in memory");
            Database::memory().context("failed to open in-memory database")?
        }
    };
    let gate = AuthGate::from_config(&cli.auth_config())?;
    Ok(AppState::new(
        db,
        RecordStore::new(cli.projection()),
        gate,
        cli.required_roles(),
    ))
}
