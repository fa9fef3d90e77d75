use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{middleware, Json, Router};
use sprop_api::models::{SensorDataQuery, SensorDataResponse};
use time::OffsetDateTime;

use crate::errors::{ApiError, SensorError};
use crate::middlewares::{auth, TokenState};
use crate::services::HistoryService;

const DEFAULT_DAYS: i64 = 7;
const MAX_DAYS: i64 = 365;

#[derive(Clone)]
pub struct SensorState {
    pub history_service: Arc<HistoryService>,
}

pub fn sensor_router(sensor_state: SensorState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/v1/sensor-data", get(get_sensor_data))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(sensor_state)
}

#[utoipa::path(
    get,
    path = "/api/v1/sensor-data",
    tag = "sensor",
    params(SensorDataQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Readings of the requested window in chronological order", body = SensorDataResponse),
        (status = 400, description = "Days missing a number or out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_sensor_data(
    State(state): State<SensorState>,
    query: Result<Query<SensorDataQuery>, QueryRejection>,
) -> Result<Json<SensorDataResponse>, ApiError> {
    let Query(query) = query.map_err(|e| SensorError::InvalidQuery(e.body_text()))?;
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(SensorError::InvalidDays(days).into());
    }

    let data = state
        .history_service
        .series(days, OffsetDateTime::now_utc())
        .await?;

    tracing::debug!("serving {} readings for {} days", data.len(), days);

    Ok(Json(SensorDataResponse { data }))
}
