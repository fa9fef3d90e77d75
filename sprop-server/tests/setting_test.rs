use axum::http::{Method, StatusCode};
use sprop_api::models::OptimizationStatus;

mod common;
use common::mock_app::{read_json, MockApp};

fn status_body(enabled: bool) -> Option<String> {
    Some(serde_json::to_string(&OptimizationStatus { enabled }).unwrap())
}

#[tokio::test]
async fn test_optimization_enabled_when_unset() {
    let app = MockApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/optimization/status", Some(&app.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let status: OptimizationStatus = read_json(response).await;
    assert!(status.enabled);
}

#[tokio::test]
async fn test_update_optimization_status() {
    let app = MockApp::new().await;

    let response = app
        .request(Method::PUT, "/api/v1/optimization/status", Some(&app.token), status_body(false))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let echoed: OptimizationStatus = read_json(response).await;
    assert!(!echoed.enabled);

    let response = app
        .request(Method::GET, "/api/v1/optimization/status", Some(&app.token), None)
        .await;
    let status: OptimizationStatus = read_json(response).await;
    assert!(!status.enabled);
}

#[tokio::test]
async fn test_update_optimization_store_failure() {
    let app = MockApp::new().await;

    sqlx::query("DROP TABLE system_settings")
        .execute(app.storage.get_pool())
        .await
        .unwrap();

    let response = app
        .request(Method::PUT, "/api/v1/optimization/status", Some(&app.token), status_body(true))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // reads still fail open
    let response = app
        .request(Method::GET, "/api/v1/optimization/status", Some(&app.token), None)
        .await;
    let status: OptimizationStatus = read_json(response).await;
    assert!(status.enabled);
}

#[tokio::test]
async fn test_optimization_requires_token() {
    let app = MockApp::new().await;

    let response = app
        .request(Method::PUT, "/api/v1/optimization/status", None, status_body(false))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
