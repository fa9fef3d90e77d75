use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use super::Table;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SensorRecord {
    pub id: i32,
    /// Stored-space time, see [`StorageOffset`]
    pub timestamp: OffsetDateTime,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity %
    pub humidity: f64,
}

/// Legacy layout of `sensor_data.timestamp`: the local wall-clock of the
/// enclosure written with a UTC label. Rows already in the table use it, so
/// writes keep it and reads undo it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageOffset(UtcOffset);

impl StorageOffset {
    pub fn from_hours(hours: i8) -> Result<Self, time::error::ComponentRange> {
        Ok(Self(UtcOffset::from_hms(hours, 0, 0)?))
    }

    /// Genuine instant into stored space, truncated to whole seconds so the
    /// textual column orders the same way as the instants do.
    pub fn to_stored(&self, instant: OffsetDateTime) -> OffsetDateTime {
        let whole = instant - Duration::nanoseconds(instant.nanosecond() as i64);
        whole.to_offset(self.0).replace_offset(UtcOffset::UTC)
    }

    /// Stored value back to a genuine UTC instant. Values carrying a real
    /// non-UTC offset are trusted and only converted.
    pub fn from_stored(&self, stored: OffsetDateTime) -> OffsetDateTime {
        if stored.offset() == UtcOffset::UTC {
            stored - Duration::seconds(self.0.whole_seconds() as i64)
        } else {
            stored.to_offset(UtcOffset::UTC)
        }
    }
}

impl Default for StorageOffset {
    fn default() -> Self {
        Self(UtcOffset::UTC)
    }
}

#[derive(Clone)]
pub struct SensorRecordTable;

impl Table for SensorRecordTable {
    fn name(&self) -> &'static str {
        "sensor_data"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS sensor_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TIMESTAMP NOT NULL,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sensor_data_timestamp ON sensor_data (timestamp);
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS sensor_data;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
