use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Physical actuators of the enclosure.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    /// Circulation fan
    Fan,
    /// Motorised lid
    Lid,
    /// Misting valve
    Valve,
}

impl Actuator {
    pub const ALL: [Actuator; 3] = [Actuator::Fan, Actuator::Lid, Actuator::Valve];

    /// Trailing topic segment used for this actuator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Actuator::Fan => "fan",
            Actuator::Lid => "lid",
            Actuator::Valve => "valve",
        }
    }
}

impl Display for Actuator {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Actuator {
    type Err = ();

    fn from_str(input: &str) -> Result<Actuator, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "fan" => Ok(Actuator::Fan),
            "lid" => Ok(Actuator::Lid),
            "valve" => Ok(Actuator::Valve),
            _ => Err(()),
        }
    }
}

/// Concrete action an actuator can be driven to.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorAction {
    On,
    Off,
    Open,
    Closed,
}

impl ActuatorAction {
    /// Canonical spelling, as tracked in memory.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActuatorAction::On => "ON",
            ActuatorAction::Off => "OFF",
            ActuatorAction::Open => "OPEN",
            ActuatorAction::Closed => "CLOSED",
        }
    }

    /// Word written to the command topic. The lid firmware only accepts `CLOSE`.
    pub fn command_word(&self, actuator: Actuator) -> &'static str {
        match (actuator, self) {
            (Actuator::Lid, ActuatorAction::Closed) => "CLOSE",
            _ => self.as_str(),
        }
    }
}

impl Display for ActuatorAction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuator_from_topic_segment() {
        assert_eq!("fan".parse::<Actuator>(), Ok(Actuator::Fan));
        assert_eq!("LID".parse::<Actuator>(), Ok(Actuator::Lid));
        assert_eq!(" valve ".parse::<Actuator>(), Ok(Actuator::Valve));
        assert!("relay".parse::<Actuator>().is_err());
    }

    #[test]
    fn test_command_word_uses_hardware_vocabulary() {
        assert_eq!(ActuatorAction::Closed.command_word(Actuator::Lid), "CLOSE");
        assert_eq!(ActuatorAction::Closed.command_word(Actuator::Valve), "CLOSED");
        assert_eq!(ActuatorAction::Open.command_word(Actuator::Lid), "OPEN");
        assert_eq!(ActuatorAction::On.command_word(Actuator::Fan), "ON");
    }
}
