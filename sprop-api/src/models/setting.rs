use serde::{Deserialize, Serialize};

/// Whether automated climate control is allowed to drive the actuators.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationStatus {
    pub enabled: bool,
}

impl Default for OptimizationStatus {
    fn default() -> Self {
        Self { enabled: true }
    }
}
