pub mod actuator_service;
pub mod auth_service;
pub mod gateway_service;
pub mod history_service;
pub mod ingest_service;
pub mod setting_service;
pub mod token_service;

pub use actuator_service::{ActuatorState, ActuatorTracker, ActuatorValue, Command, DeviceStatus, StateSource};
pub use auth_service::AuthService;
pub use gateway_service::{CommandPublisher, GatewayService, InboundMessage, MqttCommandPublisher};
pub use history_service::HistoryService;
pub use ingest_service::{Admission, IngestService, Reading, Telemetry};
pub use setting_service::SettingService;
pub use token_service::{Token, TokenClaims, TokenService};
