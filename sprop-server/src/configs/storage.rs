use std::path::Path;

use sqlx::{Error, SqlitePool};
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePoolOptions;

use crate::configs::schema::SchemaManager;
use crate::configs::settings::Database;

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(database: Database, schema_manager: SchemaManager) -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1) // in memory db might drop connection when 0
            .max_connections(10)
            .connect(&database.url)
            .await?;

        Self::create_schema(&pool, &schema_manager, &database).await?;

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round trip to the database, used by the health probe.
    pub async fn ping(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;

        Ok(())
    }

    async fn create_schema(pool: &SqlitePool, schema: &SchemaManager, database: &Database) -> Result<(), Error> {
        if database.clean_start {
            // Clean migration history
            sqlx::query("DROP TABLE IF EXISTS _sqlx_migrations")
                .execute(pool)
                .await?;

            sqlx::query(&schema.dispose_schema().join("\n"))
                .execute(pool)
                .await?;

            tracing::warn!("perform a clean boot: clean and recreate schema");
        }

        // Every statement is `IF NOT EXISTS`, an existing legacy database is left intact
        sqlx::query(&schema.create_schema().join("\n"))
            .execute(pool)
            .await?;

        if let Some(migration_path) = database.migration_path.clone() {
            let mut pool_connection = pool.acquire().await?;
            let migrator = Migrator::new(Path::new(&migration_path)).await?;
            migrator.run(&mut pool_connection).await?;

            tracing::info!("database migration success");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_database(clean_start: bool) -> Database {
        Database {
            migration_path: None,
            clean_start,
            url: String::from("sqlite::memory:"),
        }
    }

    #[tokio::test]
    async fn test_ping_memory_database() {
        let storage = Storage::new(memory_database(true), SchemaManager::default())
            .await
            .unwrap();

        assert!(storage.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_schema_created_without_clean_start() {
        let storage = Storage::new(memory_database(false), SchemaManager::default())
            .await
            .unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(storage.get_pool())
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(name,)| name.as_str()).collect();

        assert_eq!(names, vec!["sensor_data", "system_settings", "users"]);
    }
}
