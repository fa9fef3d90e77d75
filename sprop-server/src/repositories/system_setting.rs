use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::SystemSetting;

pub struct SystemSettingRepository {
    storage: Arc<Storage>,
}

impl SystemSettingRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl SystemSettingRepository {
    pub async fn find_by_key(&self, key: &str) -> Result<Option<SystemSetting>, Error> {
        let setting: Option<SystemSetting> =
            sqlx::query_as("SELECT * FROM system_settings WHERE setting_key = $1")
                .bind(key)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(setting)
    }

    pub async fn find_value(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.find_by_key(key).await?.map(|setting| setting.setting_value))
    }

    // Insert or overwrite in a single statement
    pub async fn upsert(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (setting_key, setting_value, description, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (setting_key) DO UPDATE SET
                setting_value = excluded.setting_value,
                description = COALESCE(excluded.description, system_settings.description),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }
}
