use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use sprop_api::models::{HealthResponse, ServiceInfo};
use utoipa::OpenApi;

use crate::configs::Storage;
use crate::handles::ApiDoc;

#[derive(Clone)]
pub struct SystemState {
    pub storage: Arc<Storage>,
}

pub fn system_router(system_state: SystemState) -> Router {
    Router::new()
        .route("/", get(get_service_info))
        .route("/health", get(get_health))
        .route("/api/openapi.json", get(get_openapi))
        .with_state(system_state)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service identity", body = ServiceInfo)
    )
)]
pub async fn get_service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: String::from("running"),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service and database are reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<SystemState>) -> (StatusCode, Json<HealthResponse>) {
    match state.storage.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: String::from("healthy"),
                database: String::from("connected"),
            }),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: String::from("unhealthy"),
                    database: String::from("disconnected"),
                }),
            )
        }
    }
}

pub async fn get_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
