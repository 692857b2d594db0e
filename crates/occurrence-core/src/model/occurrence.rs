use crate::error::StoreResult;
use crate::projection::Projection;
use crate::store::{Column, ColumnKind, Entity, RecordId};
use chrono::NaiveDateTime;
use rusqlite::Row;
use serde_json::{json, Map, Value};
use std::fmt;

/// An occurrence reported in the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub id: RecordId,
    pub type_tag: String,
    pub description: Option<String>,
    pub resume: String,
    pub active: bool,
    /// UTC.
    pub register_at: NaiveDateTime,
    /// UTC.
    pub update_at: NaiveDateTime,
}

impl Entity for Occurrence {
    const NAME: &'static str = "Occurrence";
    const TABLE: &'static str = "occurrence";
    const COLUMNS: &'static [Column] = &[
        Column::required("type_tag", ColumnKind::Text),
        Column::optional("description", ColumnKind::Text),
        Column::required("resume", ColumnKind::Text),
        Column::required("active", ColumnKind::Boolean),
        Column::required("register_at", ColumnKind::Timestamp),
        Column::required("update_at", ColumnKind::Timestamp),
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            type_tag: row.get(1)?,
            description: row.get(2)?,
            resume: row.get(3)?,
            active: row.get(4)?,
            register_at: row.get(5)?,
            update_at: row.get(6)?,
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn project(&self, projection: &Projection) -> StoreResult<Map<String, Value>> {
        let mut data = Map::new();
        data.insert("id".into(), json!(self.id.to_string()));
        data.insert("type_tag".into(), json!(self.type_tag));
        data.insert("description".into(), json!(self.description));
        data.insert("resume".into(), json!(self.resume));
        data.insert("active".into(), json!(self.active));
        data.insert(
            "register_at".into(),
            json!(projection.timestamp("register_at", self.register_at)?),
        );
        data.insert(
            "update_at".into(),
            json!(projection.timestamp("update_at", self.update_at)?),
        );
        Ok(data)
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Occurrence {} (type_tag={}, description={}, resume={}, active={}, register_at={}, update_at={})>",
            self.id,
            self.type_tag,
            self.description.as_deref().unwrap_or("None"),
            self.resume,
            self.active,
            self.register_at,
            self.update_at,
        )
    }
}
