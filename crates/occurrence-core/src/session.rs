//! Database handle and request-scoped sessions.
//!
//! A [`Database`] owns the SQLite connection. Callers acquire a [`Session`]
//! at request start and pass it explicitly into every store operation; the
//! session is released when dropped, rolling back any transaction that was
//! left open by an aborted request.

use crate::error::{StoreError, StoreResult};
use crate::schema::STORE_SCHEMA;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// SQLite-backed database shared across requests.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open a file-backed database.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::persistence("Failed to open database.", e))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::persistence("Failed to open database.", e))?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection, applying pragmas and schema.
    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        Self::init_connection(&conn)
            .map_err(|e| StoreError::persistence("Failed to initialise database.", e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_connection(conn: &Connection) -> rusqlite::Result<()> {
        conn.pragma_update(None, "foreign_keys", true)?;
        // In-memory databases answer "memory" and stay as they are.
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        conn.busy_timeout(Duration::from_millis(5000))?;
        conn.execute_batch(STORE_SCHEMA)?;
        Ok(())
    }

    /// Acquire a session for the duration of one request.
    pub fn session(&self) -> Session<'_> {
        let conn = self.conn.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!(
                event = "session_lock_poisoned",
                "previous holder panicked; reusing connection"
            );
            poisoned.into_inner()
        });
        Session { conn }
    }
}

/// Request-scoped access to the database.
pub struct Session<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl Session<'_> {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` as one unit of work: `BEGIN IMMEDIATE`, then `COMMIT` on
    /// success or `ROLLBACK` on any error (including a failed commit).
    pub fn unit_of_work<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let conn: &Connection = &self.conn;

        // BEGIN IMMEDIATE acquires write lock immediately
        conn.execute("BEGIN IMMEDIATE", [])
            .map_err(|e| StoreError::persistence(format!("Failed to {operation}."), e))?;

        let result = f(conn).and_then(|value| {
            conn.execute("COMMIT", [])
                .map(|_| value)
                .map_err(|e| StoreError::persistence(format!("Failed to {operation}."), e))
        });

        if let Err(err) = &result {
            tracing::error!(
                event = "unit_of_work_rollback",
                operation,
                kind = err.kind(),
                error = %err
            );
            if !conn.is_autocommit() {
                rollback(conn, operation);
            }
        }

        result
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            tracing::warn!(
                event = "session_released_mid_transaction",
                "rolling back open transaction"
            );
            rollback(&self.conn, "release session");
        }
    }
}

/// Returns whether the rollback went through. Failures are logged.
fn rollback(conn: &Connection, operation: &str) -> bool {
    match conn.execute("ROLLBACK", []) {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(event = "rollback_failed", operation, error = %e);
            false
        }
    }
}
