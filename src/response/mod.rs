//! 组合响应
//!
//! 一个"响应描述"（[`ResponsePart`]）只负责把某一类输出（文件、JSON……）写进
//! [`ResponseSink`]。多个描述可以通过 [`Composite`] / [`ResponseSequence`] 按固定顺序
//! 写入同一个 sink，前一个写完后才开始下一个，任意一步失败即中止。

mod composite;
mod parts;
mod sink;

use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use thiserror::Error;

pub use composite::{Composite, CompositeError, ResponsePartExt, ResponseSequence};
pub use parts::{FileResponse, JsonPlacement, JsonResponse};
pub use sink::ResponseSink;

/// 描述"如何把一种输出写入响应通道"的对象。
///
/// 使用 `&self` 以保持对象安全，便于放进 `Vec<Box<dyn ResponsePart>>`。
pub trait ResponsePart: Send + Sync {
    fn write_to<'a>(&'a self, sink: &'a mut ResponseSink) -> BoxFuture<'a, Result<(), ResponseError>>;
}

impl<P: ResponsePart + ?Sized> ResponsePart for Box<P> {
    fn write_to<'a>(&'a self, sink: &'a mut ResponseSink) -> BoxFuture<'a, Result<(), ResponseError>> {
        (**self).write_to(sink)
    }
}

/// 写入响应通道时的错误
#[derive(Error, Debug)]
pub enum ResponseError {
    /// JSON 序列化失败
    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 头部值不合法
    #[error("无效的头部值 {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// 组合中的第 `index` 个描述写入失败（从 0 开始）
    #[error("第 {index} 个响应描述写入失败: {source}")]
    Step {
        index: usize,
        #[source]
        source: Box<ResponseError>,
    },
}

impl ResponseError {
    pub(crate) fn at_step(self, index: usize) -> Self {
        ResponseError::Step {
            index,
            source: Box::new(self),
        }
    }
}

/// 执行单个描述并转换成 axum 响应。
pub async fn render<P: ResponsePart + ?Sized>(part: &P) -> Result<axum::response::Response, ResponseError> {
    let mut sink = ResponseSink::new();
    part.write_to(&mut sink).await?;
    Ok(sink.into_response())
}
