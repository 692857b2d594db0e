//! Record store for the Occurrence API.
//!
//! This crate provides:
//!
//! - [`Database`] / [`Session`]: SQLite handle and request-scoped sessions
//!   with unit-of-work semantics (commit or roll back per operation)
//! - [`RecordStore`]: create/get/get_group/update/delete implemented once for
//!   any [`Entity`]
//! - [`Occurrence`] and [`AnalysisType`] entities
//! - camelCase JSON projection with a configurable timestamp offset
//! - [`StoreError`]: structured `{type, details, message}` failures
//!
//! # Quick Start
//!
//! ```no_run
//! use occurrence_core::{Database, FieldMap, Occurrence, RecordStore};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), occurrence_core::StoreError> {
//! let db = Database::memory()?;
//! let store = RecordStore::<Occurrence>::default();
//!
//! let session = db.session();
//! let mut fields = FieldMap::new();
//! fields.insert("type_tag".into(), json!("leak"));
//! fields.insert("resume".into(), json!("pipe burst"));
//! fields.insert("active".into(), json!(true));
//! fields.insert("register_at".into(), json!("2024-03-10T12:00:00"));
//! fields.insert("update_at".into(), json!("2024-03-10T12:00:00"));
//!
//! let created = store.create(&session, &fields)?;
//! println!("{}", store.project(&created)?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod model;
pub mod naming;
pub mod projection;
pub mod schema;
pub mod session;
pub mod store;

pub use error::{ErrorBody, StoreError, StoreResult};
pub use model::{AnalysisType, Occurrence};
pub use projection::{Projection, DEFAULT_UTC_OFFSET_HOURS};
pub use schema::STORE_SCHEMA;
pub use session::{Database, Session};
pub use store::{Column, ColumnKind, Entity, Fetched, FieldMap, RecordId, RecordStore};
