use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// 请求 ID 使用的头部名称（请求与响应共用）
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// 注入到请求扩展中的 request_id。
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

tokio::task_local! {
    static CURRENT: String;
}

/// 获取当前任务上下文中的 request_id（不在请求作用域内时为 None）。
pub fn current_request_id() -> Option<String> {
    CURRENT.try_with(Clone::clone).ok()
}

/// 客户端传入的 ID 只接受短小且不含分隔符的值，避免日志注入。
fn accept_client_id(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let ok = (1..=128).contains(&raw.len())
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    ok.then_some(raw)
}

fn request_id_for(req: &Request) -> String {
    req.headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(accept_client_id)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("crop_{}", Uuid::new_v4().simple()))
}

/// request_id 中间件：透传或生成 ID，回写响应头，并为整个请求打开 tracing span。
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = request_id_for(&req);
    req.extensions_mut().insert(RequestId(id.clone()));

    let span = tracing::info_span!("request", request_id = %id);
    let mut res = CURRENT
        .scope(id.clone(), next.run(req).instrument(span))
        .await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    res
}
