//! Generic record store.
//!
//! [`RecordStore`] implements create/read/update/delete once for every
//! [`Entity`]. Entities describe their table and columns and how a row is
//! projected to JSON; the store owns SQL generation, value binding, units
//! of work and error mapping.
//!
//! Every operation receives the request's [`Session`] explicitly. Mutations
//! run inside [`Session::unit_of_work`], so a failed write is rolled back
//! before the error is returned.

mod fields;

pub use fields::{format_stored, parse_timestamp, Column, ColumnKind, FieldMap};

use crate::error::{StoreError, StoreResult};
use crate::naming::camelize_keys;
use crate::projection::Projection;
use crate::session::Session;
use rusqlite::{params_from_iter, OptionalExtension, Row};
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// Store-assigned record identifier.
pub type RecordId = i64;

/// Capability interface an entity type implements to be stored.
pub trait Entity: Sized {
    /// Human-readable type name used in messages and logs.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Every column except `id`, in `from_row` order.
    const COLUMNS: &'static [Column];

    /// Build the entity from a row whose columns are `id` followed by
    /// [`Self::COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn id(&self) -> RecordId;

    /// snake_case JSON projection; the store camelizes the keys.
    fn project(&self, projection: &Projection) -> StoreResult<Map<String, Value>>;
}

/// Outcome of [`RecordStore::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<E> {
    One(E),
    NotFound,
    All(Vec<E>),
}

impl<E: Entity> Fetched<E> {
    /// JSON form: an object, `null`, or an array.
    pub fn to_json(&self, store: &RecordStore<E>) -> StoreResult<Value> {
        match self {
            Self::One(record) => store.project(record),
            Self::NotFound => Ok(Value::Null),
            Self::All(records) => store.project_all(records),
        }
    }
}

/// CRUD over a single entity table.
#[derive(Debug, Clone)]
pub struct RecordStore<E> {
    projection: Projection,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for RecordStore<E> {
    fn default() -> Self {
        Self::new(Projection::default())
    }
}

impl<E: Entity> RecordStore<E> {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            _entity: PhantomData,
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    fn select_list() -> String {
        std::iter::once("id")
            .chain(E::COLUMNS.iter().map(|c| c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn select_sql(filter: &str) -> String {
        format!(
            "SELECT {} FROM {}{} ORDER BY id ASC",
            Self::select_list(),
            E::TABLE,
            filter
        )
    }

    fn load(session: &Session<'_>, id: RecordId) -> rusqlite::Result<Option<E>> {
        session
            .connection()
            .query_row(&Self::select_sql(" WHERE id = ?1"), [id], E::from_row)
            .optional()
    }

    /// Insert a new record built from `fields`.
    pub fn create(&self, session: &Session<'_>, fields: &FieldMap) -> StoreResult<E> {
        let failed = format!("Failed to create {}.", E::NAME);
        let bound = fields::bind_all(E::NAME, E::COLUMNS, fields)?;

        let record = session.unit_of_work(&format!("create {}", E::NAME), |conn| {
            let sql = if bound.is_empty() {
                format!("INSERT INTO {} DEFAULT VALUES", E::TABLE)
            } else {
                let names: Vec<&str> = bound.iter().map(|(name, _)| *name).collect();
                let marks: Vec<String> = (1..=bound.len()).map(|i| format!("?{i}")).collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    E::TABLE,
                    names.join(", "),
                    marks.join(", ")
                )
            };
            conn.execute(&sql, params_from_iter(bound.iter().map(|(_, v)| v)))
                .map_err(|e| StoreError::persistence(failed.as_str(), e))?;
            let id = conn.last_insert_rowid();
            conn.query_row(&Self::select_sql(" WHERE id = ?1"), [id], E::from_row)
                .map_err(|e| StoreError::persistence(failed.as_str(), e))
        })?;

        tracing::debug!(entity = E::NAME, id = record.id(), "record created");
        Ok(record)
    }

    /// Fetch one record by id, or every record when `id` is `None`.
    pub fn get(&self, session: &Session<'_>, id: Option<RecordId>) -> StoreResult<Fetched<E>> {
        match id {
            Some(id) => Ok(self
                .get_by_id(session, id)?
                .map_or(Fetched::NotFound, Fetched::One)),
            None => self.get_all(session).map(Fetched::All),
        }
    }

    pub fn get_by_id(&self, session: &Session<'_>, id: RecordId) -> StoreResult<Option<E>> {
        let record = Self::load(session, id)
            .map_err(|e| StoreError::persistence(format!("Error querying {}", E::NAME), e))?;
        if record.is_none() {
            tracing::debug!(entity = E::NAME, id, "no record found");
        }
        Ok(record)
    }

    pub fn get_all(&self, session: &Session<'_>) -> StoreResult<Vec<E>> {
        let records = self.query(session, "", Vec::new())?;
        if records.is_empty() {
            tracing::debug!(entity = E::NAME, "no records found");
        }
        Ok(records)
    }

    /// Records matching every known `filter` entry (ANDed equality).
    /// Keys that are not columns are ignored.
    pub fn get_group(&self, session: &Session<'_>, filter: &FieldMap) -> StoreResult<Vec<E>> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        for (name, value) in filter {
            let Some(column) = fields::find_column(E::COLUMNS, name) else {
                tracing::debug!(entity = E::NAME, field = %name, "ignoring unknown filter key");
                continue;
            };
            if value.is_null() {
                clauses.push(format!("{} IS NULL", column.name));
            } else {
                values.push(column.bind(value)?);
                clauses.push(format!("{} = ?{}", column.name, values.len()));
            }
        }
        let filter_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        self.query(session, &filter_sql, values)
    }

    fn query(
        &self,
        session: &Session<'_>,
        filter_sql: &str,
        values: Vec<rusqlite::types::Value>,
    ) -> StoreResult<Vec<E>> {
        let failed = || format!("Error querying {}", E::NAME);
        let mut stmt = session
            .connection()
            .prepare(&Self::select_sql(filter_sql))
            .map_err(|e| StoreError::persistence(failed(), e))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), E::from_row)
            .map_err(|e| StoreError::persistence(failed(), e))?;
        let records = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::persistence(failed(), e))?;
        Ok(records)
    }

    /// Overwrite exactly the given fields of record `id`.
    pub fn update(&self, session: &Session<'_>, id: RecordId, fields: &FieldMap) -> StoreResult<E> {
        let failed = format!("Failed to update {}.", E::NAME);
        let Some(current) = self.get_by_id(session, id)? else {
            tracing::info!(entity = E::NAME, id, "items not found for specified id");
            return Err(StoreError::business_rule("id not found.", failed));
        };
        let bound = fields::bind_all(E::NAME, E::COLUMNS, fields)?;
        if bound.is_empty() {
            return Ok(current);
        }

        let record = session.unit_of_work(&format!("update {}", E::NAME), |conn| {
            let assignments: Vec<String> = bound
                .iter()
                .enumerate()
                .map(|(i, (name, _))| format!("{name} = ?{}", i + 1))
                .collect();
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?{}",
                E::TABLE,
                assignments.join(", "),
                bound.len() + 1
            );
            let params = bound
                .iter()
                .map(|(_, v)| v.clone())
                .chain(std::iter::once(rusqlite::types::Value::Integer(id)));
            conn.execute(&sql, params_from_iter(params))
                .map_err(|e| StoreError::persistence(failed.as_str(), e))?;
            conn.query_row(&Self::select_sql(" WHERE id = ?1"), [id], E::from_row)
                .map_err(|e| StoreError::persistence(failed.as_str(), e))
        })?;

        tracing::debug!(entity = E::NAME, id, fields = bound.len(), "record updated");
        Ok(record)
    }

    /// Remove record `id`, returning its state before deletion.
    pub fn delete(&self, session: &Session<'_>, id: RecordId) -> StoreResult<E> {
        let failed = format!("Failed to delete id {id} from {}.", E::NAME);
        let Some(current) = self.get_by_id(session, id)? else {
            return Err(StoreError::business_rule("id not found.", failed));
        };

        session.unit_of_work(&format!("delete {}", E::NAME), |conn| {
            conn.execute(&format!("DELETE FROM {} WHERE id = ?1", E::TABLE), [id])
                .map_err(|e| StoreError::persistence(failed.as_str(), e))
        })?;

        tracing::debug!(entity = E::NAME, id, "record deleted");
        Ok(current)
    }

    /// camelCased JSON projection of one record.
    pub fn project(&self, record: &E) -> StoreResult<Value> {
        let snake = record.project(&self.projection).map_err(|e| {
            tracing::error!(entity = E::NAME, id = record.id(), error = %e, "projection failed");
            e
        })?;
        Ok(camelize_keys(Value::Object(snake)))
    }

    pub fn project_all(&self, records: &[E]) -> StoreResult<Value> {
        records
            .iter()
            .map(|r| self.project(r))
            .collect::<StoreResult<Vec<_>>>()
            .map(Value::Array)
    }
}
