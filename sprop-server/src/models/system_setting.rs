use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

/// Key of the flag gating automatic actuation.
pub const OPTIMIZATION_ENABLED: &str = "optimization_enabled";

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemSetting {
    pub setting_key: String,
    pub setting_value: String,
    pub description: Option<String>,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct SystemSettingTable;

impl Table for SystemSettingTable {
    fn name(&self) -> &'static str {
        "system_settings"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS system_settings (
                setting_key TEXT PRIMARY KEY,
                setting_value TEXT NOT NULL,
                description TEXT,
                updated_at TIMESTAMP NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS system_settings;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
