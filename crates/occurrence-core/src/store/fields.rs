//! Column metadata and binding of JSON field values to SQL values.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

/// Field-value mapping keyed by snake_case column name.
pub type FieldMap = Map<String, Value>;

/// Storage kind of a column; decides how JSON values are bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Boolean,
    Integer,
    Timestamp,
}

/// A non-identifier column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl Column {
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    /// Convert a JSON value into the SQL value stored in this column.
    /// `null` always binds to SQL NULL; NOT NULL constraints are left to
    /// the database.
    pub fn bind(&self, value: &Value) -> StoreResult<SqlValue> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        let bound = match (self.kind, value) {
            (ColumnKind::Text, Value::String(s)) => Some(SqlValue::Text(s.clone())),
            (ColumnKind::Boolean, Value::Bool(b)) => Some(SqlValue::Integer(i64::from(*b))),
            (ColumnKind::Integer, Value::Number(n)) => n.as_i64().map(SqlValue::Integer),
            (ColumnKind::Timestamp, Value::String(s)) => {
                parse_timestamp(s).map(|ts| SqlValue::Text(format_stored(ts)))
            }
            _ => None,
        };
        bound.ok_or_else(|| {
            StoreError::persistence(
                format!("Invalid value for field '{}'.", self.name),
                format!("expected {:?}, got {}", self.kind, value),
            )
        })
    }
}

/// Stored timestamp representation (UTC, naive), matching rusqlite's
/// chrono encoding so rows read back as `NaiveDateTime`.
pub fn format_stored(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// Parse an inbound timestamp. RFC 3339 values are normalised to UTC;
/// naive values are taken as UTC already.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

pub(crate) fn find_column<'c>(columns: &'c [Column], name: &str) -> Option<&'c Column> {
    columns.iter().find(|c| c.name == name)
}

/// Bind every entry of `fields`, rejecting names that are not columns.
pub(crate) fn bind_all(
    entity: &str,
    columns: &[Column],
    fields: &FieldMap,
) -> StoreResult<Vec<(&'static str, SqlValue)>> {
    fields
        .iter()
        .map(|(name, value)| {
            let column = find_column(columns, name).ok_or_else(|| {
                StoreError::persistence(
                    format!("Unknown field '{name}' for {entity}."),
                    "field is not a writable column",
                )
            })?;
            Ok((column.name, column.bind(value)?))
        })
        .collect()
}
