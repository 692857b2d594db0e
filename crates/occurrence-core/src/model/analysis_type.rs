use crate::error::StoreResult;
use crate::projection::Projection;
use crate::store::{Column, ColumnKind, Entity, RecordId};
use rusqlite::Row;
use serde_json::{json, Map, Value};

/// Catalogue entry describing a kind of analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisType {
    pub id: RecordId,
    pub name: String,
    pub tag: String,
    pub description: Option<String>,
    pub metadata: Option<String>,
    pub is_active: bool,
    /// HTML icon markup.
    pub icon: String,
}

impl Entity for AnalysisType {
    const NAME: &'static str = "AnalysisType";
    const TABLE: &'static str = "analysis_type";
    const COLUMNS: &'static [Column] = &[
        Column::required("name", ColumnKind::Text),
        Column::required("tag", ColumnKind::Text),
        Column::optional("description", ColumnKind::Text),
        Column::optional("metadata", ColumnKind::Text),
        Column::required("is_active", ColumnKind::Boolean),
        Column::required("icon", ColumnKind::Text),
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            tag: row.get(2)?,
            description: row.get(3)?,
            metadata: row.get(4)?,
            is_active: row.get(5)?,
            icon: row.get(6)?,
        })
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn project(&self, _projection: &Projection) -> StoreResult<Map<String, Value>> {
        let mut data = Map::new();
        data.insert("id".into(), json!(self.id.to_string()));
        data.insert("name".into(), json!(self.name));
        data.insert("tag".into(), json!(self.tag));
        data.insert("description".into(), json!(self.description));
        data.insert("metadata".into(), json!(self.metadata));
        data.insert("is_active".into(), json!(self.is_active));
        data.insert("icon".into(), json!(self.icon));
        Ok(data)
    }
}
