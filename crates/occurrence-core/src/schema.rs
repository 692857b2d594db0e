//! SQLite schema for the record store.
//!
//! Tables:
//! - `occurrence`: field occurrences reported against a line
//! - `analysis_type`: catalogue of analysis kinds

/// DDL for the store tables. Idempotent.
///
/// `AUTOINCREMENT` keeps identifiers from ever being reused after deletes.
pub const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS occurrence (
    id           INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    type_tag     TEXT NOT NULL,
    description  TEXT,
    resume       TEXT NOT NULL,
    active       INTEGER NOT NULL CHECK (active IN (0, 1)),
    register_at  TEXT NOT NULL,
    update_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS analysis_type (
    id           INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name         TEXT NOT NULL,
    tag          TEXT NOT NULL,
    description  TEXT,
    metadata     TEXT,
    is_active    INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    icon         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_occurrence_type_tag
    ON occurrence(type_tag);
"#;
