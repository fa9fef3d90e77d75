//! Payloads exchanged with the enclosure controller over MQTT.
//!
//! Telemetry is deliberately not modelled as a struct here: the controller
//! firmware has shipped several field spellings, so the server resolves it
//! field by field from a raw JSON object.

use serde::{Deserialize, Serialize};

use crate::models::{Actuator, ActuatorAction};

/// Published by the controller on `<status_prefix>/<actuator>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceStatusPayload {
    #[serde(default)]
    pub status: Option<String>,
    /// ISO-8601, optional
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Published by the server on `<command_prefix>/<actuator>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub action: String,
}

impl CommandPayload {
    pub fn new(actuator: Actuator, action: ActuatorAction) -> Self {
        Self {
            action: action.command_word(actuator).to_string(),
        }
    }
}
