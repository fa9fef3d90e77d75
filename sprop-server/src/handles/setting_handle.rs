use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{middleware, Json, Router};
use sprop_api::models::OptimizationStatus;

use crate::errors::{ApiError, SettingError};
use crate::middlewares::{auth, TokenState};
use crate::models::OPTIMIZATION_ENABLED;
use crate::services::SettingService;

#[derive(Clone)]
pub struct SettingState {
    pub setting_service: Arc<SettingService>,
}

pub fn setting_router(setting_state: SettingState, token_state: TokenState) -> Router {
    Router::new()
        .route(
            "/api/v1/optimization/status",
            get(get_optimization_status).put(update_optimization_status),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(setting_state)
}

#[utoipa::path(
    get,
    path = "/api/v1/optimization/status",
    tag = "setting",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current optimization flag, enabled when unset", body = OptimizationStatus),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_optimization_status(
    State(state): State<SettingState>,
) -> Json<OptimizationStatus> {
    Json(OptimizationStatus {
        enabled: state.setting_service.optimization_enabled().await,
    })
}

#[utoipa::path(
    put,
    path = "/api/v1/optimization/status",
    tag = "setting",
    request_body = OptimizationStatus,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Flag stored", body = OptimizationStatus),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Failed to store the flag")
    )
)]
pub async fn update_optimization_status(
    State(state): State<SettingState>,
    Json(body): Json<OptimizationStatus>,
) -> Result<Json<OptimizationStatus>, ApiError> {
    state
        .setting_service
        .set_optimization_enabled(body.enabled)
        .await
        .map_err(|e| {
            tracing::error!("failed to store optimization flag: {}", e);
            SettingError::StoreFailed(OPTIMIZATION_ENABLED)
        })?;

    Ok(Json(body))
}
