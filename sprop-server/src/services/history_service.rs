use std::sync::Arc;

use sprop_api::models::SensorDataPoint;
use time::{Duration, OffsetDateTime};

use crate::configs::Storage;
use crate::models::StorageOffset;
use crate::repositories::SensorRecordRepository;

/// One reading every five seconds.
const SAMPLES_PER_DAY: i64 = 17_280;
const FALLBACK_LIMIT: i64 = 10_000;

/// Builds the historical series served to the mobile client.
pub struct HistoryService {
    repository: SensorRecordRepository,
    offset: StorageOffset,
}

impl HistoryService {
    pub fn new(storage: Arc<Storage>, offset: StorageOffset) -> Self {
        Self {
            repository: SensorRecordRepository::new(storage),
            offset,
        }
    }

    /// Readings of the trailing `days` before `now`, oldest first, with
    /// genuine UTC timestamps.
    pub async fn series(&self, days: i64, now: OffsetDateTime) -> Result<Vec<SensorDataPoint>, sqlx::Error> {
        let end = now + Duration::minutes(1);
        let start = end - Duration::days(days);
        let ceiling = self.offset.to_stored(now + Duration::days(1));

        let mut records = self
            .repository
            .find_in_range(self.offset.to_stored(start), self.offset.to_stored(end), ceiling)
            .await?;

        if records.is_empty() {
            let limit = (days * SAMPLES_PER_DAY).min(FALLBACK_LIMIT);
            tracing::warn!("no readings in the last {} days, serving the latest {}", days, limit);

            records = self.repository.find_latest_n(limit, ceiling).await?;
            records.reverse();
        } else if let Some(latest) = self.repository.find_latest(ceiling).await? {
            if !records.iter().any(|record| record.timestamp == latest.timestamp) {
                tracing::debug!("appending latest reading outside the window");
                records.push(latest);
            }
        }

        records.sort_by_key(|record| record.timestamp);

        Ok(records
            .into_iter()
            .map(|record| SensorDataPoint {
                timestamp: self.offset.from_stored(record.timestamp),
                temperature: record.temperature,
                humidity: record.humidity,
            })
            .collect())
    }
}
