use std::fmt::{self, Display, Formatter};

use crate::threshold::Band;

/// Fan command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Switch {
    On,
    Off,
}

/// Lid or valve command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Open,
    Closed,
}

impl Display for Switch {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Switch::On => write!(f, "ON"),
            Switch::Off => write!(f, "OFF"),
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Position::Open => write!(f, "OPEN"),
            Position::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Recommended action per actuator for a single reading.
///
/// `None` means the rule set has no opinion and the actuator should be
/// left as it is, which is not the same as switching it off.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorDecision {
    pub fan: Option<Switch>,
    pub lid: Option<Position>,
    pub valve: Option<Position>,
    pub temperature_band: Band,
    pub humidity_band: Band,
    pub reason: String,
}

impl ActuatorDecision {
    /// Emergency cooling and regular cooling share the same actuation.
    pub(crate) fn ventilate() -> (Option<Switch>, Option<Position>) {
        (Some(Switch::On), Some(Position::Open))
    }

    /// Keep heat and moisture inside.
    pub(crate) fn seal() -> (Option<Switch>, Option<Position>) {
        (Some(Switch::Off), Some(Position::Closed))
    }
}

fn label<T: Display>(action: &Option<T>) -> String {
    action
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "NONE".to_string())
}

impl Display for ActuatorDecision {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "fan={} lid={} valve={}",
            label(&self.fan),
            label(&self.lid),
            label(&self.valve)
        )
    }
}
