//! Telemetry ingestion: raw MQTT payloads in, readings persisted and
//! actuator commands out.

use std::sync::Arc;

use serde_json::{Map, Value};
use sprop_analyser::RuleEngine;
use sprop_api::models::Actuator;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::configs::{GatewayTopic, Storage};
use crate::errors::IngestError;
use crate::models::{SensorRecord, StorageOffset};
use crate::repositories::SensorRecordRepository;
use crate::services::actuator_service::{
    ActuatorTracker, ActuatorValue, Command, DeviceStatus, ReportedStates, normalize_status,
};
use crate::services::gateway_service::{CommandPublisher, InboundMessage};
use crate::services::setting_service::SettingService;

/// Readings further ahead than this are dropped.
const MAX_AHEAD: Duration = Duration::days(1);
/// Readings further behind than this are re-stamped to now.
const MAX_BEHIND: Duration = Duration::days(365);

/// Field spellings shipped by the controller firmware, most specific first.
pub fn aliases(actuator: Actuator) -> &'static [&'static str] {
    match actuator {
        Actuator::Fan => &["fan_state", "relay", "fan"],
        Actuator::Lid => &["lid_state", "lid"],
        Actuator::Valve => &["valve_state", "valve"],
    }
}

/// Parses RFC 3339 first, then ISO 8601 with or without an offset. A
/// missing offset means UTC.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let candidate = raw.replacen(' ', "T", 1);

    match OffsetDateTime::parse(&candidate, &Rfc3339).or_else(|_| OffsetDateTime::parse(&candidate, &Iso8601::DEFAULT)) {
        // None when the UTC instant falls outside the representable years
        Ok(timestamp) => timestamp.checked_to_offset(UtcOffset::UTC),
        Err(_) => PrimitiveDateTime::parse(&candidate, &Iso8601::DEFAULT)
            .map(PrimitiveDateTime::assume_utc)
            .ok(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Genuine UTC
    pub timestamp: OffsetDateTime,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    pub reading: Reading,
    pub reported: ReportedStates,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Accepted(Telemetry),
    /// Timestamp was implausibly old and has been replaced by now
    Retimestamped(Telemetry),
    /// Timestamp lies in the future, the reading must not be used
    Rejected(Telemetry),
}

impl Admission {
    /// Telemetry fit for persistence and control.
    pub fn admitted(self) -> Option<Telemetry> {
        match self {
            Admission::Accepted(telemetry) | Admission::Retimestamped(telemetry) => Some(telemetry),
            Admission::Rejected(_) => None,
        }
    }
}

impl Telemetry {
    pub fn admit(mut self, now: OffsetDateTime) -> Admission {
        let timestamp = self.reading.timestamp;

        if timestamp > now + MAX_AHEAD {
            Admission::Rejected(self)
        } else if timestamp < now - MAX_BEHIND {
            self.reading.timestamp = now;
            Admission::Retimestamped(self)
        } else {
            Admission::Accepted(self)
        }
    }
}

fn number(fields: &Map<String, Value>, name: &'static str) -> Result<f64, IngestError> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(IngestError::MissingField(name)),
        Some(value) => value.as_f64().ok_or(IngestError::InvalidField(name)),
    }
}

fn reported_state(fields: &Map<String, Value>, actuator: Actuator) -> Option<ActuatorValue> {
    aliases(actuator).iter().find_map(|alias| {
        let raw = match fields.get(*alias)? {
            Value::Null => return None,
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        normalize_status(actuator, &raw)
    })
}

/// Turns a raw telemetry payload into a reading plus any actuator states
/// reported alongside it. Timestamp problems never fail the message.
pub fn normalize(raw: &[u8], now: OffsetDateTime) -> Result<Telemetry, IngestError> {
    let Value::Object(fields) = serde_json::from_slice::<Value>(raw)? else {
        return Err(IngestError::NotAnObject);
    };

    let temperature = number(&fields, "temperature")?;
    let humidity = number(&fields, "humidity")?;

    let timestamp = match fields.get("timestamp") {
        None | Some(Value::Null) => now,
        Some(Value::String(text)) if text.trim().is_empty() => now,
        Some(Value::String(text)) => parse_timestamp(text).unwrap_or_else(|| {
            warn!("invalid telemetry timestamp {:?}, using now", text);
            now
        }),
        Some(other) => {
            warn!("telemetry timestamp is not a string: {}, using now", other);
            now
        }
    };

    let reported = Actuator::ALL
        .into_iter()
        .filter_map(|actuator| reported_state(&fields, actuator).map(|value| (actuator, value)))
        .collect();

    Ok(Telemetry {
        reading: Reading {
            timestamp,
            temperature,
            humidity,
        },
        reported,
    })
}

/// Sole owner of the actuator tracker. Handles one message to completion
/// before taking the next.
pub struct IngestService {
    engine: RuleEngine,
    tracker: ActuatorTracker,
    topic: GatewayTopic,
    offset: StorageOffset,
    storage: Arc<Storage>,
    sensor_record_repository: Arc<SensorRecordRepository>,
    setting_service: Arc<SettingService>,
    publisher: Arc<dyn CommandPublisher>,
}

impl IngestService {
    pub fn new(
        engine: RuleEngine,
        topic: GatewayTopic,
        offset: StorageOffset,
        storage: Arc<Storage>,
        setting_service: Arc<SettingService>,
        publisher: Arc<dyn CommandPublisher>,
    ) -> Self {
        Self {
            engine,
            tracker: ActuatorTracker::new(OffsetDateTime::now_utc()),
            topic,
            offset,
            sensor_record_repository: Arc::new(SensorRecordRepository::new(storage.clone())),
            storage,
            setting_service,
            publisher,
        }
    }

    pub fn tracker(&self) -> &ActuatorTracker {
        &self.tracker
    }

    pub async fn run(mut self, mut receiver: mpsc::Receiver<InboundMessage>) {
        info!("ingestion started with {} policy", self.engine.policy());

        while let Some(message) = receiver.recv().await {
            self.handle(message).await;
        }

        info!("ingestion stopped, gateway channel closed");
    }

    pub async fn handle(&mut self, message: InboundMessage) {
        let now = OffsetDateTime::now_utc();

        if message.topic == self.topic.sensor {
            self.handle_telemetry(&message.payload, now).await;
        } else if let Some(actuator) = self.topic.actuator_of(&message.topic) {
            self.handle_status(actuator, &message.payload, now);
        } else if message.topic.starts_with(&self.topic.status_prefix) {
            warn!("status for unknown actuator on {}, ignored", message.topic);
        } else {
            debug!("unhandled topic {}", message.topic);
        }
    }

    /// Returns the commands that reached the broker.
    pub async fn handle_telemetry(&mut self, payload: &[u8], now: OffsetDateTime) -> Vec<Command> {
        let telemetry = match normalize(payload, now) {
            Ok(telemetry) => telemetry,
            Err(e) => {
                error!("dropping telemetry: {}", e);
                return Vec::new();
            }
        };

        let admission = telemetry.admit(now);
        match &admission {
            Admission::Accepted(_) => {}
            Admission::Retimestamped(_) => warn!("telemetry timestamp more than a year old, stamped with now"),
            Admission::Rejected(telemetry) => {
                warn!("telemetry timestamp {} lies in the future, dropped", telemetry.reading.timestamp)
            }
        }
        let Some(telemetry) = admission.admitted() else {
            return Vec::new();
        };
        let reading = &telemetry.reading;

        match self.persist(reading).await {
            Ok(id) => debug!("stored reading {}", id),
            Err(e) => error!("failed to store reading: {}", e),
        }

        if !self.setting_service.optimization_enabled().await {
            debug!("optimization disabled, no control");
            return Vec::new();
        }

        let decision = self.engine.decide(reading.temperature, reading.humidity);
        info!("T={:.1}C H={:.1}% {} ({})", reading.temperature, reading.humidity, decision, decision.reason);

        let mut sent = Vec::new();
        for command in self.tracker.plan(&decision, &telemetry.reported) {
            match self.publisher.publish(&command).await {
                Ok(()) => {
                    info!("sent {}", command);
                    self.tracker.record_sent(&command, now);
                    sent.push(command);
                }
                Err(e) => error!("failed to send {}: {}", command, e),
            }
        }

        sent
    }

    pub fn handle_status(&mut self, actuator: Actuator, payload: &[u8], now: OffsetDateTime) {
        match DeviceStatus::parse(actuator, payload, now) {
            Ok(Some(status)) => self.tracker.apply_status(status),
            Ok(None) => {}
            Err(e) => error!("dropping {} status: {}", actuator, e),
        }
    }

    async fn persist(&self, reading: &Reading) -> Result<i32, sqlx::Error> {
        let record = SensorRecord {
            id: 0,
            timestamp: self.offset.to_stored(reading.timestamp),
            temperature: reading.temperature,
            humidity: reading.humidity,
        };

        let mut tx = self.storage.get_pool().begin().await?;
        let id = self.sensor_record_repository.create(&record, &mut tx).await?;
        tx.commit().await?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use sprop_api::models::ActuatorAction;
    use time::macros::datetime;

    use super::*;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00:00 UTC);

    #[test]
    fn test_normalize_minimal_reading() {
        let telemetry = normalize(br#"{"temperature": 22.5, "humidity": 55}"#, NOW).unwrap();

        assert_eq!(telemetry.reading.temperature, 22.5);
        assert_eq!(telemetry.reading.humidity, 55.0);
        assert_eq!(telemetry.reading.timestamp, NOW);
        assert!(telemetry.reported.is_empty());
    }

    #[test]
    fn test_normalize_rejects_bad_payloads() {
        assert!(matches!(normalize(b"{", NOW), Err(IngestError::MalformedPayload(_))));
        assert!(matches!(normalize(b"[1, 2]", NOW), Err(IngestError::NotAnObject)));
        assert!(matches!(
            normalize(br#"{"temperature": 20}"#, NOW),
            Err(IngestError::MissingField("humidity"))
        ));
        assert!(matches!(
            normalize(br#"{"temperature": null, "humidity": 50}"#, NOW),
            Err(IngestError::MissingField("temperature"))
        ));
        assert!(matches!(
            normalize(br#"{"temperature": "warm", "humidity": 50}"#, NOW),
            Err(IngestError::InvalidField("temperature"))
        ));
    }

    #[test]
    fn test_timestamp_forms() {
        let at = |raw: &str| {
            let payload = format!(r#"{{"temperature": 20, "humidity": 50, "timestamp": "{raw}"}}"#);
            normalize(payload.as_bytes(), NOW).unwrap().reading.timestamp
        };

        assert_eq!(at("2024-06-01T10:00:00Z"), datetime!(2024-06-01 10:00:00 UTC));
        assert_eq!(at("2024-06-01T18:00:00+08:00"), datetime!(2024-06-01 10:00:00 UTC));
        assert_eq!(at("2024-06-01T10:00:00"), datetime!(2024-06-01 10:00:00 UTC));
        assert_eq!(at("2024-06-01 10:00:00.250"), datetime!(2024-06-01 10:00:00.250 UTC));
        assert_eq!(at("half past ten"), NOW);
        assert_eq!(at(""), NOW);
    }

    #[test]
    fn test_timestamp_beyond_utc_range_uses_now() {
        assert_eq!(parse_timestamp("9999-12-31T23:00:00-02:00"), None);
        assert_eq!(
            parse_timestamp("9999-12-31T23:00:00+02:00"),
            Some(datetime!(9999-12-31 21:00:00 UTC))
        );

        let telemetry = normalize(
            br#"{"temperature": 20, "humidity": 50, "timestamp": "9999-12-31T23:00:00-02:00"}"#,
            NOW,
        )
        .unwrap();
        assert_eq!(telemetry.reading.timestamp, NOW);

        let status = DeviceStatus::parse(
            Actuator::Fan,
            br#"{"status": "ON", "timestamp": "9999-12-31T23:00:00-02:00"}"#,
            NOW,
        )
        .unwrap()
        .unwrap();
        assert_eq!(status.timestamp, NOW);
    }

    #[test]
    fn test_non_string_timestamp_uses_now() {
        let telemetry = normalize(br#"{"temperature": 20, "humidity": 50, "timestamp": 1717236000}"#, NOW).unwrap();

        assert_eq!(telemetry.reading.timestamp, NOW);
    }

    #[test]
    fn test_reported_state_aliases() {
        let telemetry = normalize(
            br#"{"temperature": 20, "humidity": 50, "relay": "running", "fan": "off", "lid": " close ", "valve_state": null, "valve": "Opened"}"#,
            NOW,
        )
        .unwrap();

        assert_eq!(telemetry.reported[&Actuator::Fan], ActuatorValue::Known(ActuatorAction::On));
        assert_eq!(telemetry.reported[&Actuator::Lid], ActuatorValue::Known(ActuatorAction::Closed));
        assert_eq!(telemetry.reported[&Actuator::Valve], ActuatorValue::Known(ActuatorAction::Open));
    }

    #[test]
    fn test_reported_state_coerces_scalars() {
        let telemetry = normalize(br#"{"temperature": 20, "humidity": 50, "fan_state": true}"#, NOW).unwrap();

        assert_eq!(telemetry.reported[&Actuator::Fan], ActuatorValue::Other(String::from("TRUE")));
    }

    fn stamped(timestamp: OffsetDateTime) -> Telemetry {
        Telemetry {
            reading: Reading {
                timestamp,
                temperature: 20.0,
                humidity: 50.0,
            },
            reported: ReportedStates::new(),
        }
    }

    #[test]
    fn test_admission_rejects_two_days_ahead() {
        let admission = stamped(NOW + Duration::days(2)).admit(NOW);

        assert!(matches!(admission, Admission::Rejected(_)));
        assert!(admission.admitted().is_none());
    }

    #[test]
    fn test_admission_accepts_twelve_hours_ahead() {
        let admission = stamped(NOW + Duration::hours(12)).admit(NOW);

        assert_eq!(admission, Admission::Accepted(stamped(NOW + Duration::hours(12))));
    }

    #[test]
    fn test_admission_restamps_two_years_old() {
        let admission = stamped(NOW - Duration::days(730)).admit(NOW);

        assert_eq!(admission, Admission::Retimestamped(stamped(NOW)));
        assert_eq!(admission.admitted().unwrap().reading.timestamp, NOW);
    }

    #[test]
    fn test_admission_boundaries_are_kept() {
        assert!(matches!(stamped(NOW + MAX_AHEAD).admit(NOW), Admission::Accepted(_)));
        assert!(matches!(stamped(NOW - MAX_BEHIND).admit(NOW), Admission::Accepted(_)));
    }
}
