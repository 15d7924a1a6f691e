use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    routing::get,
};
use tower::ServiceExt;

use kawaii_crop::{AppConfig, AppError, AppState, build_app, request_id::request_id_middleware};

async fn fail_handler() -> Result<&'static str, AppError> {
    Err(AppError::BadRequest("bad request".into()))
}

fn header_value(resp: &axum::response::Response) -> String {
    resp.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[tokio::test]
async fn request_id_is_generated_when_missing() {
    let config = AppConfig::default();
    let app = build_app(&config, AppState::from_config(&config));
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .expect("request /health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header_value(&resp).starts_with("crop_"));
}

#[tokio::test]
async fn request_id_uses_client_value_when_valid() {
    let config = AppConfig::default();
    let app = build_app(&config, AppState::from_config(&config));
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "client.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /health");

    assert_eq!(header_value(&resp), "client.req-001");
}

#[tokio::test]
async fn invalid_client_value_is_replaced() {
    let config = AppConfig::default();
    let app = build_app(&config, AppState::from_config(&config));
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "has space")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /health");

    let id = header_value(&resp);
    assert_ne!(id, "has space");
    assert!(id.starts_with("crop_"));
}

#[tokio::test]
async fn problem_details_contains_request_id() {
    let app = Router::new()
        .route("/fail", get(fail_handler))
        .layer(axum::middleware::from_fn(request_id_middleware));
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/fail")
                .header("x-request-id", "err.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /fail");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("parse json");
    assert_eq!(json["requestId"], "err.req-001");
}
