//! Request bodies.
//!
//! Clients send camelCase JSON. Bodies are decamelized first and then
//! checked against a typed payload, so unknown or ill-typed fields are
//! answered with 422 before the store is touched.

use occurrence_core::naming::decamelize_keys;
use occurrence_core::store::parse_timestamp;
use occurrence_core::FieldMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::response::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOccurrence {
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resume: String,
    pub active: bool,
    pub register_at: String,
    pub update_at: String,
}

/// Partial update. Absent fields keep their stored value; `description` may
/// be cleared with an explicit `null`, the other fields may not be null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOccurrence {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Only runs for keys present in the body, so `Some` marks "given". A
/// `null` is handed to `T`, which rejects it unless `T` is itself an
/// `Option`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A payload that can be handed to the record store.
pub trait Payload: DeserializeOwned + Serialize {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }

    /// Parses a raw camelCase body.
    fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let raw: Value = serde_json::from_slice(body).map_err(ApiError::invalid_body)?;
        let payload: Self =
            serde_json::from_value(decamelize_keys(raw)).map_err(ApiError::invalid_body)?;
        payload.validate()?;
        Ok(payload)
    }

    fn into_fields(self) -> Result<FieldMap, ApiError> {
        match serde_json::to_value(&self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ApiError::Internal(format!("payload is not an object: {other}"))),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }
}

impl Payload for CreateOccurrence {
    fn validate(&self) -> Result<(), ApiError> {
        for (field, raw) in [("registerAt", &self.register_at), ("updateAt", &self.update_at)] {
            if parse_timestamp(raw).is_none() {
                return Err(ApiError::invalid_body(format!(
                    "{field}: expected an ISO-8601 timestamp, got {raw:?}"
                )));
            }
        }
        Ok(())
    }
}

impl Payload for UpdateOccurrence {}
