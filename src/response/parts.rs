use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue, header};
use futures_util::{FutureExt, future::BoxFuture};
use serde::Serialize;

use super::{ResponseError, ResponsePart, ResponseSink};

fn header_value(name: &HeaderName, raw: &str) -> Result<HeaderValue, ResponseError> {
    HeaderValue::from_str(raw).map_err(|e| ResponseError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// 文件下载：写入 Content-Type、可选的 Content-Disposition 与文件字节。
#[derive(Debug, Clone)]
pub struct FileResponse {
    body: Bytes,
    content_type: String,
    file_name: Option<String>,
}

impl FileResponse {
    pub fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
            file_name: None,
        }
    }

    /// 建议的下载文件名（写入 `Content-Disposition: attachment`）
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    fn disposition(&self) -> Option<String> {
        let name = self.file_name.as_deref()?;
        // 引号与反斜杠会破坏 quoted-string，统一替换
        let safe: String = name
            .chars()
            .map(|c| if c == '"' || c == '\\' { '_' } else { c })
            .collect();
        Some(format!("attachment; filename=\"{safe}\""))
    }
}

impl ResponsePart for FileResponse {
    fn write_to<'a>(&'a self, sink: &'a mut ResponseSink) -> BoxFuture<'a, Result<(), ResponseError>> {
        async move {
            let content_type = header_value(&header::CONTENT_TYPE, &self.content_type)?;
            let disposition = self
                .disposition()
                .map(|d| header_value(&header::CONTENT_DISPOSITION, &d))
                .transpose()?;

            sink.insert_header(header::CONTENT_TYPE, content_type);
            if let Some(d) = disposition {
                sink.insert_header(header::CONTENT_DISPOSITION, d);
            }
            sink.write_body(&self.body);
            Ok(())
        }
        .boxed()
    }
}

/// JSON 的写入位置
#[derive(Debug, Clone)]
pub enum JsonPlacement {
    /// 作为响应体（Content-Type: application/json）
    Body,
    /// 序列化为紧凑 JSON 写入指定头部
    Header(HeaderName),
}

/// JSON 载荷
#[derive(Debug, Clone)]
pub struct JsonResponse<T> {
    value: T,
    placement: JsonPlacement,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn body(value: T) -> Self {
        Self {
            value,
            placement: JsonPlacement::Body,
        }
    }

    pub fn in_header(name: HeaderName, value: T) -> Self {
        Self {
            value,
            placement: JsonPlacement::Header(name),
        }
    }
}

impl<T: Serialize + Send + Sync> ResponsePart for JsonResponse<T> {
    fn write_to<'a>(&'a self, sink: &'a mut ResponseSink) -> BoxFuture<'a, Result<(), ResponseError>> {
        async move {
            let bytes = serde_json::to_vec(&self.value)?;
            match &self.placement {
                JsonPlacement::Body => {
                    sink.insert_header(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    );
                    sink.write_body(&bytes);
                }
                JsonPlacement::Header(name) => {
                    let value = HeaderValue::from_bytes(&bytes).map_err(|e| {
                        ResponseError::InvalidHeader {
                            name: name.to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                    sink.insert_header(name.clone(), value);
                }
            }
            Ok(())
        }
        .boxed()
    }
}
