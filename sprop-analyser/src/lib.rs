//! Climate rule engine for the orchid enclosure.
//!
//! Maps one temperature/humidity reading to a recommended action per
//! actuator. Nothing in this crate performs I/O or keeps state between
//! calls; deduplication against the hardware state happens in the server.

pub mod cascading;
pub mod decision;
pub mod decision_tree;
pub mod engine;
pub mod threshold;

pub use decision::{ActuatorDecision, Position, Switch};
pub use engine::{ControlPolicy, RuleEngine};
pub use threshold::{Band, ThresholdError, Thresholds};

pub(crate) fn fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}
