use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};

/// 单个 HTTP 响应（200）的输出通道：头部与按写入顺序累积的响应体。
#[derive(Debug)]
pub struct ResponseSink {
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink {
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 写入头部（同名头部会被覆盖）
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// 追加响应体字节
    pub fn write_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl IntoResponse for ResponseSink {
    fn into_response(self) -> Response {
        let mut res = Response::new(Body::from(self.body));
        *res.headers_mut() = self.headers;
        res
    }
}
