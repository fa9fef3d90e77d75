//! Cascading priority with emergency overrides.
//!
//! 1. Critical temperature (either side) wins outright.
//! 2. Humidity above the optimal range wins next.
//! 3. Otherwise temperature's opinion wins per actuator, humidity fills the
//!    gaps, and a fully optimal reading settles on fan off / lid closed.
//!
//! The valve is never driven by this policy.

use crate::decision::{ActuatorDecision, Position, Switch};
use crate::fahrenheit;
use crate::threshold::{Band, Thresholds};

struct Opinion {
    fan: Option<Switch>,
    lid: Option<Position>,
    message: String,
}

fn temperature_opinion(thresholds: &Thresholds, temperature: f64, band: Band) -> Opinion {
    let (min, max) = thresholds.temperature_optimal;
    let (critical_min, critical_max) = thresholds.temperature_critical;
    let reading = format!("Temperature {:.1}°C ({:.1}°F)", temperature, fahrenheit(temperature));

    let ((fan, lid), message) = match band {
        Band::CriticalHigh => (
            ActuatorDecision::ventilate(),
            format!("Critical: {reading} exceeds {critical_max}°C - emergency cooling"),
        ),
        Band::CriticalLow => (
            ActuatorDecision::seal(),
            format!("Critical: {reading} below {critical_min}°C - emergency heating"),
        ),
        Band::TooHigh => (
            ActuatorDecision::ventilate(),
            format!("{reading} above optimal range ({min}-{max}°C) - cooling needed"),
        ),
        Band::TooLow => (
            ActuatorDecision::seal(),
            format!("{reading} below optimal range ({min}-{max}°C) - heating needed"),
        ),
        Band::Optimal => (
            (None, None),
            format!("{reading} within optimal range ({min}-{max}°C)"),
        ),
    };

    Opinion { fan, lid, message }
}

fn humidity_opinion(thresholds: &Thresholds, humidity: f64, band: Band) -> Opinion {
    let (min, max) = thresholds.humidity_optimal;

    match band {
        Band::TooHigh | Band::CriticalHigh => Opinion {
            fan: Some(Switch::On),
            lid: Some(Position::Open),
            message: format!("Humidity {humidity:.1}% above optimal range ({min}-{max}%) - dehumidifying"),
        },
        Band::TooLow | Band::CriticalLow => Opinion {
            fan: Some(Switch::Off),
            lid: Some(Position::Closed),
            message: format!("Humidity {humidity:.1}% below optimal range ({min}-{max}%) - retaining moisture"),
        },
        // Lid was possibly opened to dehumidify; close it again once back in range.
        Band::Optimal => Opinion {
            fan: None,
            lid: Some(Position::Closed),
            message: format!("Humidity {humidity:.1}% within optimal range ({min}-{max}%)"),
        },
    }
}

pub fn decide(thresholds: &Thresholds, temperature: f64, humidity: f64) -> ActuatorDecision {
    let temperature_band = thresholds.temperature_band(temperature);
    let humidity_band = thresholds.humidity_band(humidity);

    let by_temperature = temperature_opinion(thresholds, temperature, temperature_band);
    let by_humidity = humidity_opinion(thresholds, humidity, humidity_band);

    let (fan, lid) = if temperature_band.is_critical() {
        (by_temperature.fan, by_temperature.lid)
    } else if humidity_band == Band::TooHigh {
        (by_humidity.fan, by_humidity.lid)
    } else {
        let mut fan = by_temperature.fan.or(by_humidity.fan);
        let mut lid = by_temperature.lid.or(by_humidity.lid);

        if temperature_band == Band::Optimal && humidity_band == Band::Optimal {
            fan = fan.or(Some(Switch::Off));
            lid = lid.or(Some(Position::Closed));
        }

        (fan, lid)
    };

    ActuatorDecision {
        fan,
        lid,
        valve: None,
        temperature_band,
        humidity_band,
        reason: format!("{} | {}", by_temperature.message, by_humidity.message),
    }
}
