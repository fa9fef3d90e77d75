use serde::{Deserialize, Serialize};

/// Where a measurement sits relative to its configured ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    CriticalLow,
    TooLow,
    Optimal,
    TooHigh,
    CriticalHigh,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::CriticalLow => "critical_low",
            Band::TooLow => "too_low",
            Band::Optimal => "optimal",
            Band::TooHigh => "too_high",
            Band::CriticalHigh => "critical_high",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Band::CriticalLow | Band::CriticalHigh)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ThresholdError {
    #[error("Range {name} is inverted: {min} >= {max}")]
    InvertedRange { name: &'static str, min: f64, max: f64 },

    #[error("Range {name} has a bound that is not a finite number")]
    NonFinite { name: &'static str },

    #[error("Critical temperature range must enclose the optimal range")]
    CriticalInsideOptimal,
}

/// Range limits for orchid care. Bounds are inclusive on the optimal side:
/// a reading exactly on a limit never triggers an action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Comfortable temperature range in Celsius
    pub temperature_optimal: (f64, f64),
    /// Temperatures outside this range are emergencies
    pub temperature_critical: (f64, f64),
    /// Comfortable relative humidity range in percent
    pub humidity_optimal: (f64, f64),
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_optimal: (18.0, 24.0),
            temperature_critical: (10.0, 30.0),
            humidity_optimal: (40.0, 70.0),
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let ranges = [
            ("temperature_optimal", self.temperature_optimal),
            ("temperature_critical", self.temperature_critical),
            ("humidity_optimal", self.humidity_optimal),
        ];
        for (name, (min, max)) in ranges {
            if !min.is_finite() || !max.is_finite() {
                return Err(ThresholdError::NonFinite { name });
            }
            if min >= max {
                return Err(ThresholdError::InvertedRange { name, min, max });
            }
        }

        if self.temperature_critical.0 > self.temperature_optimal.0
            || self.temperature_critical.1 < self.temperature_optimal.1
        {
            return Err(ThresholdError::CriticalInsideOptimal);
        }

        Ok(())
    }

    pub fn temperature_band(&self, temperature: f64) -> Band {
        let (optimal_min, optimal_max) = self.temperature_optimal;
        let (critical_min, critical_max) = self.temperature_critical;

        if temperature > critical_max {
            Band::CriticalHigh
        } else if temperature < critical_min {
            Band::CriticalLow
        } else if temperature > optimal_max {
            Band::TooHigh
        } else if temperature < optimal_min {
            Band::TooLow
        } else {
            Band::Optimal
        }
    }

    /// Humidity has no emergency tier.
    pub fn humidity_band(&self, humidity: f64) -> Band {
        let (optimal_min, optimal_max) = self.humidity_optimal;

        if humidity > optimal_max {
            Band::TooHigh
        } else if humidity < optimal_min {
            Band::TooLow
        } else {
            Band::Optimal
        }
    }
}
