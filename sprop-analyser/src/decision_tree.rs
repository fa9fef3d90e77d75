//! Strict decision tree: the first matching branch wins and there is no
//! emergency tier. Unlike the cascading policy, humidity extremes also
//! drive the misting valve.
//!
//! | order | condition               | fan | lid    | valve  |
//! |-------|-------------------------|-----|--------|--------|
//! | 1     | temperature above range | ON  | OPEN   | -      |
//! | 2     | temperature below range | OFF | CLOSED | -      |
//! | 3     | humidity above range    | ON  | OPEN   | CLOSED |
//! | 4     | humidity below range    | OFF | CLOSED | OPEN   |
//! | 5     | otherwise               | OFF | CLOSED | -      |

use crate::decision::{ActuatorDecision, Position, Switch};
use crate::fahrenheit;
use crate::threshold::{Band, Thresholds};

pub fn decide(thresholds: &Thresholds, temperature: f64, humidity: f64) -> ActuatorDecision {
    let temperature_band = thresholds.temperature_band(temperature);
    let humidity_band = thresholds.humidity_band(humidity);
    let (temperature_min, temperature_max) = thresholds.temperature_optimal;
    let (humidity_min, humidity_max) = thresholds.humidity_optimal;
    let reading = format!(
        "{:.1}°C ({:.1}°F), {:.1}%",
        temperature,
        fahrenheit(temperature),
        humidity
    );

    let (fan, lid, valve, reason) = match (temperature_band, humidity_band) {
        (Band::TooHigh | Band::CriticalHigh, _) => (
            Some(Switch::On),
            Some(Position::Open),
            None,
            format!("{reading}: temperature above {temperature_max}°C - cooling"),
        ),
        (Band::TooLow | Band::CriticalLow, _) => (
            Some(Switch::Off),
            Some(Position::Closed),
            None,
            format!("{reading}: temperature below {temperature_min}°C - heating"),
        ),
        (_, Band::TooHigh | Band::CriticalHigh) => (
            Some(Switch::On),
            Some(Position::Open),
            Some(Position::Closed),
            format!("{reading}: humidity above {humidity_max}% - dehumidifying"),
        ),
        (_, Band::TooLow | Band::CriticalLow) => (
            Some(Switch::Off),
            Some(Position::Closed),
            Some(Position::Open),
            format!("{reading}: humidity below {humidity_min}% - misting"),
        ),
        _ => (
            Some(Switch::Off),
            Some(Position::Closed),
            None,
            format!("{reading}: conditions optimal"),
        ),
    };

    ActuatorDecision {
        fan,
        lid,
        valve,
        temperature_band,
        humidity_band,
        reason,
    }
}
