use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::decision::ActuatorDecision;
use crate::threshold::{ThresholdError, Thresholds};
use crate::{cascading, decision_tree};

/// Which rule set drives the actuators.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPolicy {
    /// Emergency temperature tier, then humidity, then temperature preference.
    #[default]
    Cascading,
    /// First-match decision tree, also drives the valve.
    DecisionTree,
}

impl Display for ControlPolicy {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ControlPolicy::Cascading => write!(f, "cascading"),
            ControlPolicy::DecisionTree => write!(f, "decision_tree"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleEngine {
    policy: ControlPolicy,
    thresholds: Thresholds,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self {
            policy: ControlPolicy::default(),
            thresholds: Thresholds::default(),
        }
    }
}

impl RuleEngine {
    pub fn new(policy: ControlPolicy, thresholds: Thresholds) -> Result<Self, ThresholdError> {
        thresholds.validate()?;

        Ok(Self { policy, thresholds })
    }

    pub fn policy(&self) -> ControlPolicy {
        self.policy
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn decide(&self, temperature: f64, humidity: f64) -> ActuatorDecision {
        match self.policy {
            ControlPolicy::Cascading => cascading::decide(&self.thresholds, temperature, humidity),
            ControlPolicy::DecisionTree => {
                decision_tree::decide(&self.thresholds, temperature, humidity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::decision::{Position, Switch};

    use super::*;

    fn engine(policy: ControlPolicy) -> RuleEngine {
        RuleEngine::new(policy, Thresholds::default()).unwrap()
    }

    fn sweep(from: f64, to: f64) -> impl Iterator<Item = f64> {
        let steps = 200;
        (0..=steps).map(move |i| from + (to - from) * i as f64 / steps as f64)
    }

    #[test]
    fn test_hot_always_ventilates() {
        let cascading = engine(ControlPolicy::Cascading);
        let tree = engine(ControlPolicy::DecisionTree);

        for temperature in sweep(30.01, 60.0) {
            for humidity in sweep(0.0, 100.0).step_by(20) {
                let decision = cascading.decide(temperature, humidity);
                assert_eq!(decision.fan, Some(Switch::On));
                assert_eq!(decision.lid, Some(Position::Open));
            }
        }

        for temperature in sweep(24.01, 60.0) {
            for humidity in sweep(0.0, 100.0).step_by(20) {
                let decision = tree.decide(temperature, humidity);
                assert_eq!(decision.fan, Some(Switch::On));
                assert_eq!(decision.lid, Some(Position::Open));
            }
        }
    }

    #[test]
    fn test_cold_always_seals() {
        let cascading = engine(ControlPolicy::Cascading);
        let tree = engine(ControlPolicy::DecisionTree);

        for temperature in sweep(-20.0, 9.99) {
            for humidity in sweep(0.0, 100.0).step_by(20) {
                let decision = cascading.decide(temperature, humidity);
                assert_eq!(decision.fan, Some(Switch::Off));
                assert_eq!(decision.lid, Some(Position::Closed));
            }
        }

        for temperature in sweep(-20.0, 17.99) {
            for humidity in sweep(0.0, 100.0).step_by(20) {
                let decision = tree.decide(temperature, humidity);
                assert_eq!(decision.fan, Some(Switch::Off));
                assert_eq!(decision.lid, Some(Position::Closed));
            }
        }
    }

    #[test]
    fn test_decide_is_pure() {
        for policy in [ControlPolicy::Cascading, ControlPolicy::DecisionTree] {
            let engine = engine(policy);
            for (temperature, humidity) in [(26.0, 50.0), (20.0, 75.0), (12.0, 35.0), (f64::NAN, 50.0)] {
                let first = engine.decide(temperature, humidity);
                let _ = engine.decide(35.0, 95.0);
                let second = engine.decide(temperature, humidity);

                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_policies_disagree_on_warm_humid() {
        // 26°C is warm but not critical; 80% is humid.
        let cascading = engine(ControlPolicy::Cascading).decide(26.0, 80.0);
        let tree = engine(ControlPolicy::DecisionTree).decide(26.0, 80.0);

        assert_eq!(cascading.fan, tree.fan);
        assert_eq!(cascading.valve, None);
        assert_eq!(tree.valve, None);

        // 20°C, 30%: only the tree opens the valve.
        let cascading = engine(ControlPolicy::Cascading).decide(20.0, 30.0);
        let tree = engine(ControlPolicy::DecisionTree).decide(20.0, 30.0);

        assert_eq!(cascading.valve, None);
        assert_eq!(tree.valve, Some(Position::Open));
    }

    #[test]
    fn test_rejects_invalid_thresholds() {
        let thresholds = Thresholds {
            temperature_optimal: (24.0, 18.0),
            ..Default::default()
        };

        assert!(RuleEngine::new(ControlPolicy::Cascading, thresholds).is_err());
    }

    #[test]
    fn test_policy_from_config_value() {
        let policy: ControlPolicy = serde_json::from_str(r#""decision_tree""#).unwrap();

        assert_eq!(policy, ControlPolicy::DecisionTree);
        assert_eq!(policy.to_string(), "decision_tree");
    }
}
