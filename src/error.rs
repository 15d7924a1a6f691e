use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::ResponseError;

/// 应用统一错误类型（请求结构层面的问题，统一以 ProblemDetails 返回）
#[derive(Error, Debug)]
pub enum AppError {
    /// 请求格式错误（multipart 损坏、整数参数无法解析等）
    #[error("请求格式错误: {0}")]
    BadRequest(String),

    /// 缺少必需字段
    #[error("缺少必需字段: {0}")]
    MissingField(String),

    /// 请求体过大
    #[error("请求体过大: {0}")]
    PayloadTooLarge(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// 裁剪错误（纯文本响应，见 [`CropError`]）
    #[error(transparent)]
    Crop(#[from] CropError),
}

/// 裁剪处理错误。
///
/// 与 [`AppError`] 不同，这里的响应体是纯文本：
/// - `InvalidDimensions` 固定返回 400 与校验提示
/// - 其余变体均为处理期失败，返回 500，消息为固定前缀 + 底层错误描述
#[derive(Error, Debug)]
pub enum CropError {
    /// 宽或高不为正数（在解码之前即拒绝）
    #[error("Invalid width or height. Both width and height must be greater than 0.")]
    InvalidDimensions,

    /// 无法解码上传的图片
    #[error("{0}")]
    Decode(String),

    /// 裁剪区域超出源图范围
    #[error(
        "Crop rectangle ({x}, {y}, {width}x{height}) is not inside the source image bounds ({image_width}x{image_height})."
    )]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        image_width: u32,
        image_height: u32,
    },

    /// JPEG 编码失败
    #[error("{0}")]
    Encode(String),

    /// 阻塞任务或并发许可异常
    #[error("{0}")]
    Worker(String),
}

/// 处理期错误的固定前缀
pub const PROCESSING_ERROR_PREFIX: &str = "An error occurred while processing the image: ";

impl CropError {
    fn status_code(&self) -> StatusCode {
        match self {
            CropError::InvalidDimensions => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 对外返回的纯文本消息
    pub fn public_message(&self) -> String {
        match self {
            CropError::InvalidDimensions => self.to_string(),
            _ => format!("{PROCESSING_ERROR_PREFIX}{self}"),
        }
    }
}

impl IntoResponse for CropError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}

/// RFC7807 风格的错误响应（Problem Details）。
///
/// 设计目标：
/// - 让所有结构性错误返回结构化 JSON，便于调用方稳定处理
/// - 与 OpenAPI 一致（content-type = application/problem+json）
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Bad Request")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 400)]
    pub status: u16,

    /// 人类可读的详细信息（尽量稳定，不建议依赖解析）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "MISSING_FIELD")]
    pub code: String,

    /// 可选：请求追踪 ID。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Crop(e) => e.status_code(),
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::MissingField(_) => "MISSING_FIELD",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Crop(CropError::InvalidDimensions) => "INVALID_DIMENSIONS",
            AppError::Crop(_) => "IMAGE_PROCESSING_FAILED",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::PAYLOAD_TOO_LARGE => "Payload Too Large",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Crop(e) = self {
            return e.into_response();
        }

        let status = self.status_code();
        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl From<ResponseError> for AppError {
    fn from(err: ResponseError) -> Self {
        AppError::Internal(format!("响应组装失败: {err}"))
    }
}
