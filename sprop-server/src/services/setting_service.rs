use std::sync::Arc;

use crate::configs::Storage;
use crate::models::OPTIMIZATION_ENABLED;
use crate::repositories::SystemSettingRepository;

const OPTIMIZATION_DESCRIPTION: &str = "Whether automatic climate control may drive the actuators";

pub struct SettingService {
    storage: Arc<Storage>,
    repository: SystemSettingRepository,
}

impl SettingService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            repository: SystemSettingRepository::new(storage.clone()),
            storage,
        }
    }

    /// Unset and unreadable both count as enabled.
    pub async fn optimization_enabled(&self) -> bool {
        match self.repository.find_value(OPTIMIZATION_ENABLED).await {
            Ok(Some(value)) => value.trim().eq_ignore_ascii_case("true"),
            Ok(None) => true,
            Err(e) => {
                tracing::error!("failed to read {}, assuming enabled: {}", OPTIMIZATION_ENABLED, e);
                true
            }
        }
    }

    pub async fn set_optimization_enabled(&self, enabled: bool) -> Result<(), sqlx::Error> {
        let mut tx = self.storage.get_pool().begin().await?;
        self.repository
            .upsert(OPTIMIZATION_ENABLED, &enabled.to_string(), Some(OPTIMIZATION_DESCRIPTION), &mut tx)
            .await?;
        tx.commit().await?;

        tracing::info!("optimization {}", if enabled { "enabled" } else { "disabled" });

        Ok(())
    }
}
