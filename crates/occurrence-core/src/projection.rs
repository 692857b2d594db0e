use crate::error::{StoreError, StoreResult};
use chrono::{Duration, NaiveDateTime};

/// Offset applied to stored (UTC) timestamps before they are rendered.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;

/// Timestamp format used in JSON projections.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Rendering options shared by every entity projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    utc_offset: Duration,
}

impl Default for Projection {
    fn default() -> Self {
        Self::with_offset_hours(DEFAULT_UTC_OFFSET_HOURS)
    }
}

impl Projection {
    pub fn new(utc_offset: Duration) -> Self {
        Self { utc_offset }
    }

    pub fn with_offset_hours(hours: i32) -> Self {
        Self::new(Duration::seconds(i64::from(hours) * 3600))
    }

    pub fn utc_offset(&self) -> Duration {
        self.utc_offset
    }

    pub fn timestamp(&self, field: &str, value: NaiveDateTime) -> StoreResult<String> {
        value
            .checked_add_signed(self.utc_offset)
            .map(|local| local.format(TIMESTAMP_FORMAT).to_string())
            .ok_or_else(|| {
                StoreError::serialization(
                    "Failed to convert to JSON.",
                    format!("{field} out of range after applying offset"),
                )
            })
    }
}
