use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::features::{crop, health};
use crate::openapi::openapi_for_prefix;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 组装完整的 HTTP 应用：业务路由、健康检查、文档与全局中间件。
pub fn build_app(config: &AppConfig, state: AppState) -> Router {
    let api_router = Router::<AppState>::new().merge(crop::create_crop_router(&config.crop));

    let prefix = normalize_prefix(&config.api.prefix);
    let app = Router::<AppState>::new().route("/health", get(health::health_check));
    let app = if prefix.is_empty() {
        app.merge(api_router)
    } else {
        app.nest(&prefix, api_router)
    };

    app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi_for_prefix(&prefix)))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 最外层：保证 trace span 与错误响应都能拿到 request_id
        .layer(axum::middleware::from_fn(request_id_middleware))
}

/// `"api/v1/"` -> `"/api/v1"`，空或 `"/"` -> `""`
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_prefix;

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("api/v1/"), "/api/v1");
        assert_eq!(normalize_prefix("/api"), "/api");
    }
}
