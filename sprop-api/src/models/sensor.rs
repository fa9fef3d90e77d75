use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One point of the historical series served to the mobile client.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDataPoint {
    /// Sample time, genuine UTC
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDataResponse {
    /// Points in chronological order
    pub data: Vec<SensorDataPoint>,
}

#[cfg_attr(feature = "docs", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "docs", into_params(parameter_in = Query))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorDataQuery {
    /// Trailing window in days (1-365, default 7)
    pub days: Option<i64>,
}
