use std::env;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use sprop_analyser::{ControlPolicy, Thresholds};
use sprop_api::models::Actuator;

use crate::configs::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Keep alive interval in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive: u64,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub tls: bool,
    /// Extra CA bundle trusted on top of the native roots
    pub ca_path: Option<String>,
    pub auth: Option<GatewayAuth>,
    pub topic: GatewayTopic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayAuth {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTopic {
    pub sensor: String,
    pub status_prefix: String,
    pub command_prefix: String,
}

impl GatewayTopic {
    pub fn status(&self, actuator: Actuator) -> String {
        format!("{}/{}", self.status_prefix, actuator)
    }

    pub fn command(&self, actuator: Actuator) -> String {
        format!("{}/{}", self.command_prefix, actuator)
    }

    /// Resolves the actuator a status topic belongs to.
    pub fn actuator_of(&self, topic: &str) -> Option<Actuator> {
        topic
            .strip_prefix(&self.status_prefix)?
            .strip_prefix('/')?
            .parse()
            .ok()
    }
}

impl Default for GatewayTopic {
    fn default() -> Self {
        Self {
            sensor: String::from("sprop/sensor/data"),
            status_prefix: String::from("sprop/status"),
            command_prefix: String::from("sprop/cmd"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub migration_path: Option<String>,
    pub clean_start: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    pub secret: String,
    pub expiration: u64,
    /// Protects sensor and optimization routes with bearer tokens
    #[serde(default = "default_required")]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Control {
    #[serde(default)]
    pub policy: ControlPolicy,
    /// Hours between UTC and the wall-clock persisted in `sensor_data`
    #[serde(default = "default_storage_offset_hours")]
    pub storage_offset_hours: i8,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            policy: ControlPolicy::default(),
            storage_offset_hours: default_storage_offset_hours(),
            thresholds: Thresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub gateway: Gateway,
    pub database: Database,
    pub auth: Auth,
    #[serde(default)]
    pub control: Control,
}

fn default_keep_alive() -> u64 {
    60
}

fn default_required() -> bool {
    true
}

fn default_storage_offset_hours() -> i8 {
    8
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("SPROP").separator("__"))
            .build()?
            .try_deserialize()?;

        if let Some(auth) = &settings.gateway.auth {
            let cert_path = Self::resolve(&auth.cert_path)?;
            let key_path = Self::resolve(&auth.key_path)?;

            settings.gateway.auth = Some(GatewayAuth { cert_path, key_path });
        }

        if let Some(ca_path) = &settings.gateway.ca_path {
            settings.gateway.ca_path = Some(Self::resolve(ca_path)?);
        }

        if let Some(migrate) = &settings.database.migration_path {
            if Path::new(migrate).is_dir() {
                settings.database.migration_path = Some(Self::resolve(migrate)?);
            } else {
                settings.database.migration_path = None;
            }
        }

        settings
            .control
            .thresholds
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(settings)
    }

    fn resolve(path: &str) -> Result<String, ConfigError> {
        Ok(normalize_path(path)
            .map_err(|e| ConfigError::Message(e.to_string()))?
            .to_string_lossy()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_follow_prefixes() {
        let topic = GatewayTopic::default();

        assert_eq!(topic.status(Actuator::Fan), "sprop/status/fan");
        assert_eq!(topic.command(Actuator::Valve), "sprop/cmd/valve");
    }

    #[test]
    fn test_actuator_of_status_topic() {
        let topic = GatewayTopic::default();

        assert_eq!(topic.actuator_of("sprop/status/lid"), Some(Actuator::Lid));
        assert_eq!(topic.actuator_of("sprop/status/valve"), Some(Actuator::Valve));
        assert_eq!(topic.actuator_of("sprop/status/pump"), None);
        assert_eq!(topic.actuator_of("sprop/statusfan"), None);
        assert_eq!(topic.actuator_of("sprop/sensor/data"), None);
    }

    #[test]
    fn test_control_section_defaults() {
        let control: Control = serde_json::from_str("{}").unwrap();

        assert_eq!(control.policy, ControlPolicy::Cascading);
        assert_eq!(control.storage_offset_hours, 8);
        assert_eq!(control.thresholds, Thresholds::default());
    }

    #[test]
    fn test_auth_required_by_default() {
        let auth: Auth = serde_json::from_str(r#"{"secret":"s","expiration":60}"#).unwrap();

        assert!(auth.required);
    }
}
