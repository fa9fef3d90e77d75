use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::SensorRecord;

/// Append-only access to `sensor_data`. Every timestamp crossing this
/// boundary, bound or returned, is in stored space.
pub struct SensorRecordRepository {
    storage: Arc<Storage>,
}

impl SensorRecordRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl SensorRecordRepository {
    pub async fn create(
        &self,
        item: &SensorRecord,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i32, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO sensor_data (timestamp, temperature, humidity)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(item.timestamp)
        .bind(item.temperature)
        .bind(item.humidity)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id as i32)
    }

    // Records inside [start, end] and not past the ceiling, oldest first
    pub async fn find_in_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
        ceiling: OffsetDateTime,
    ) -> Result<Vec<SensorRecord>, Error> {
        let records: Vec<SensorRecord> = sqlx::query_as(
            r#"
            SELECT id, timestamp, temperature, humidity FROM sensor_data
            WHERE timestamp >= $1 AND timestamp <= $2 AND timestamp <= $3
            ORDER BY timestamp ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(ceiling)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(records)
    }

    pub async fn find_latest(&self, ceiling: OffsetDateTime) -> Result<Option<SensorRecord>, Error> {
        let record: Option<SensorRecord> = sqlx::query_as(
            r#"
            SELECT id, timestamp, temperature, humidity FROM sensor_data
            WHERE timestamp <= $1
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(ceiling)
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(record)
    }

    // Newest first
    pub async fn find_latest_n(&self, limit: i64, ceiling: OffsetDateTime) -> Result<Vec<SensorRecord>, Error> {
        let records: Vec<SensorRecord> = sqlx::query_as(
            r#"
            SELECT id, timestamp, temperature, humidity FROM sensor_data
            WHERE timestamp <= $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(ceiling)
        .bind(limit)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::configs::{Database, SchemaManager};

    use super::*;

    async fn setup_test_db() -> Arc<Storage> {
        Arc::new(
            Storage::new(
                Database {
                    migration_path: None,
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        )
    }

    async fn insert(repo: &SensorRecordRepository, storage: &Storage, timestamp: OffsetDateTime, temperature: f64) {
        let record = SensorRecord {
            id: 0,
            timestamp,
            temperature,
            humidity: 55.0,
        };
        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.create(&record, &mut tx).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_find_in_range_ascending() {
        let storage = setup_test_db().await;
        let repo = SensorRecordRepository::new(storage.clone());

        insert(&repo, &storage, datetime!(2024-05-02 12:00:00 UTC), 22.0).await;
        insert(&repo, &storage, datetime!(2024-05-01 12:00:00 UTC), 21.0).await;
        insert(&repo, &storage, datetime!(2024-04-01 12:00:00 UTC), 20.0).await;

        let records = repo
            .find_in_range(
                datetime!(2024-05-01 00:00:00 UTC),
                datetime!(2024-05-03 00:00:00 UTC),
                datetime!(2024-05-04 00:00:00 UTC),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].temperature, 21.0);
        assert_eq!(records[1].temperature, 22.0);
        assert_eq!(records[1].timestamp, datetime!(2024-05-02 12:00:00 UTC));
    }

    #[tokio::test]
    async fn test_ceiling_hides_future_rows() {
        let storage = setup_test_db().await;
        let repo = SensorRecordRepository::new(storage.clone());

        insert(&repo, &storage, datetime!(2024-05-01 12:00:00 UTC), 21.0).await;
        insert(&repo, &storage, datetime!(2031-01-01 00:00:00 UTC), 99.0).await;

        let latest = repo
            .find_latest(datetime!(2024-05-02 00:00:00 UTC))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.temperature, 21.0);

        let records = repo
            .find_in_range(
                datetime!(2024-01-01 00:00:00 UTC),
                datetime!(2032-01-01 00:00:00 UTC),
                datetime!(2024-05-02 00:00:00 UTC),
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_find_latest_n_descending() {
        let storage = setup_test_db().await;
        let repo = SensorRecordRepository::new(storage.clone());

        for day in 1..=5 {
            let timestamp = datetime!(2024-05-01 08:00:00 UTC) + time::Duration::days(day);
            insert(&repo, &storage, timestamp, 20.0 + day as f64).await;
        }

        let records = repo
            .find_latest_n(3, datetime!(2025-01-01 00:00:00 UTC))
            .await
            .unwrap();

        let temperatures: Vec<f64> = records.iter().map(|r| r.temperature).collect();
        assert_eq!(temperatures, vec![25.0, 24.0, 23.0]);
    }

    #[tokio::test]
    async fn test_find_latest_on_empty_table() {
        let storage = setup_test_db().await;
        let repo = SensorRecordRepository::new(storage.clone());

        let latest = repo.find_latest(OffsetDateTime::now_utc()).await.unwrap();

        assert!(latest.is_none());
    }
}
