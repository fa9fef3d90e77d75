//! In-memory view of the enclosure hardware and the dedup rule deciding
//! which recommendations turn into commands.
//!
//! The tracker has exactly one owner, the ingestion task. Device status
//! messages and the tracker's own optimistic updates both write to it and
//! the latest write wins.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use sprop_analyser::{ActuatorDecision, Position, Switch};
use sprop_api::message::{CommandPayload, DeviceStatusPayload};
use sprop_api::models::{Actuator, ActuatorAction};
use time::OffsetDateTime;

use crate::errors::IngestError;
use crate::services::ingest_service::parse_timestamp;

/// Last known position of an actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorValue {
    Unknown,
    Known(ActuatorAction),
    /// Hardware word outside the actuator's vocabulary, upper-cased
    Other(String),
}

impl Display for ActuatorValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ActuatorValue::Unknown => write!(f, "UNKNOWN"),
            ActuatorValue::Known(action) => write!(f, "{}", action),
            ActuatorValue::Other(word) => write!(f, "{}", word),
        }
    }
}

/// Reported states carried inline by a telemetry message.
pub type ReportedStates = BTreeMap<Actuator, ActuatorValue>;

fn vocabulary(actuator: Actuator) -> &'static [ActuatorAction] {
    match actuator {
        Actuator::Fan => &[ActuatorAction::On, ActuatorAction::Off],
        Actuator::Lid | Actuator::Valve => &[ActuatorAction::Open, ActuatorAction::Closed],
    }
}

/// Maps a raw hardware word to the canonical state of `actuator`.
///
/// Returns `None` for blank input. Applying it to its own output yields
/// the same value.
pub fn normalize_status(actuator: Actuator, raw: &str) -> Option<ActuatorValue> {
    let word = raw.trim().to_uppercase();
    if word.is_empty() {
        return None;
    }

    let action = match word.as_str() {
        "UNKNOWN" => return Some(ActuatorValue::Unknown),
        "ON" | "RUNNING" | "START" => ActuatorAction::On,
        "OFF" | "STOPPED" | "STOP" => ActuatorAction::Off,
        "OPEN" | "OPENED" => ActuatorAction::Open,
        "CLOSED" | "CLOSE" => ActuatorAction::Closed,
        _ => return Some(ActuatorValue::Other(word)),
    };

    if vocabulary(actuator).contains(&action) {
        Some(ActuatorValue::Known(action))
    } else {
        Some(ActuatorValue::Other(word))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    Initial,
    Device,
    Optimistic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorState {
    pub actuator: Actuator,
    pub value: ActuatorValue,
    pub last_updated: OffsetDateTime,
    pub source: StateSource,
}

/// Status report published by the controller for one actuator.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub actuator: Actuator,
    pub value: ActuatorValue,
    pub timestamp: OffsetDateTime,
}

impl DeviceStatus {
    /// Parses a status payload. A blank or missing status is not an error,
    /// it yields `None`.
    pub fn parse(actuator: Actuator, payload: &[u8], now: OffsetDateTime) -> Result<Option<Self>, IngestError> {
        let payload: DeviceStatusPayload = serde_json::from_slice(payload)?;

        let Some(value) = payload
            .status
            .as_deref()
            .and_then(|raw| normalize_status(actuator, raw))
        else {
            tracing::warn!("empty status for {}, ignored", actuator);
            return Ok(None);
        };

        let timestamp = match payload.timestamp.as_deref() {
            Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
                tracing::warn!("invalid status timestamp {:?} for {}, using now", raw, actuator);
                now
            }),
            None => now,
        };

        Ok(Some(Self { actuator, value, timestamp }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub actuator: Actuator,
    pub action: ActuatorAction,
}

impl Command {
    pub fn payload(&self) -> CommandPayload {
        CommandPayload::new(self.actuator, self.action)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.actuator, self.action.command_word(self.actuator))
    }
}

/// Recommendation of `decision` for one actuator.
pub fn desired_action(decision: &ActuatorDecision, actuator: Actuator) -> Option<ActuatorAction> {
    let position = |position: Option<Position>| {
        position.map(|p| match p {
            Position::Open => ActuatorAction::Open,
            Position::Closed => ActuatorAction::Closed,
        })
    };

    match actuator {
        Actuator::Fan => decision.fan.map(|switch| match switch {
            Switch::On => ActuatorAction::On,
            Switch::Off => ActuatorAction::Off,
        }),
        Actuator::Lid => position(decision.lid),
        Actuator::Valve => position(decision.valve),
    }
}

/// A command is due when there is a recommendation and the hardware is not
/// already known to be in that state.
pub fn reconcile(actuator: Actuator, desired: Option<ActuatorAction>, current: &ActuatorValue) -> Option<Command> {
    let action = desired?;

    match current {
        ActuatorValue::Known(known) if *known == action => None,
        _ => Some(Command { actuator, action }),
    }
}

#[derive(Debug, Clone)]
pub struct ActuatorTracker {
    states: BTreeMap<Actuator, ActuatorState>,
}

impl ActuatorTracker {
    pub fn new(now: OffsetDateTime) -> Self {
        let states = Actuator::ALL
            .into_iter()
            .map(|actuator| {
                let state = ActuatorState {
                    actuator,
                    value: ActuatorValue::Unknown,
                    last_updated: now,
                    source: StateSource::Initial,
                };
                (actuator, state)
            })
            .collect();

        Self { states }
    }

    pub fn current(&self, actuator: Actuator) -> &ActuatorState {
        // every actuator is seeded in `new`
        &self.states[&actuator]
    }

    /// Commands needed to follow `decision`, fan first. Inline reports take
    /// precedence over the tracked value but are not recorded.
    pub fn plan(&self, decision: &ActuatorDecision, reported: &ReportedStates) -> Vec<Command> {
        Actuator::ALL
            .into_iter()
            .filter_map(|actuator| {
                let current = reported
                    .get(&actuator)
                    .unwrap_or(&self.current(actuator).value);
                let desired = desired_action(decision, actuator);

                let command = reconcile(actuator, desired, current);
                if command.is_none() {
                    if let Some(action) = desired {
                        tracing::debug!("{} already {}, no command", actuator, action);
                    }
                }
                command
            })
            .collect()
    }

    pub fn record_sent(&mut self, command: &Command, at: OffsetDateTime) {
        self.set(command.actuator, ActuatorValue::Known(command.action), at, StateSource::Optimistic);
    }

    pub fn apply_status(&mut self, status: DeviceStatus) {
        let previous = self.current(status.actuator).value.clone();
        if previous != status.value {
            tracing::info!("{} reported {} (was {})", status.actuator, status.value, previous);
        }

        self.set(status.actuator, status.value, status.timestamp, StateSource::Device);
    }

    fn set(&mut self, actuator: Actuator, value: ActuatorValue, at: OffsetDateTime, source: StateSource) {
        self.states.insert(
            actuator,
            ActuatorState {
                actuator,
                value,
                last_updated: at,
                source,
            },
        );
    }
}
