use axum::http::HeaderName;
use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// 裁剪结果的建议文件名
pub const CROPPED_FILE_NAME: &str = "cropped_image.jpg";

/// 成功提示文本
pub const CROP_SUCCESS_MESSAGE: &str = "Image cropped successfully";

/// 承载 JSON 结果的响应头
pub static CROP_RESULT_HEADER: HeaderName = HeaderName::from_static("x-crop-result");

/// multipart 中图片字段的名称
pub const IMAGE_FIELD: &str = "imageFile";

/// 裁剪参数。Query 与表单字段同名且不区分大小写，缺省值为 0，表单字段优先。
#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CropQuery {
    /// 裁剪起点 X
    #[param(example = 10)]
    pub crop_x: Option<i32>,
    /// 裁剪起点 Y
    #[param(example = 10)]
    pub crop_y: Option<i32>,
    /// 裁剪宽度（必须大于 0）
    #[param(example = 100)]
    pub width: Option<i32>,
    /// 裁剪高度（必须大于 0）
    #[param(example = 100)]
    pub height: Option<i32>,
}

/// multipart 表单（仅用于 OpenAPI 描述）
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CropUploadForm {
    /// 待裁剪的图片文件
    #[schema(value_type = String, format = Binary)]
    pub image_file: Vec<u8>,
    pub crop_x: Option<i32>,
    pub crop_y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// 裁剪区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRegion {
    /// 宽高必须为正数；不做源图范围检查（解码后由 [`CropRegion::fit`] 负责）。
    pub fn validate(self) -> Result<Self, CropError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(CropError::InvalidDimensions);
        }
        Ok(self)
    }

    /// 将区域映射到 `image_width x image_height` 的源图上，超出范围即报错。
    pub fn fit(self, image_width: u32, image_height: u32) -> Result<(u32, u32, u32, u32), CropError> {
        let out_of_bounds = || CropError::OutOfBounds {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            image_width,
            image_height,
        };
        let (Ok(x), Ok(y), Ok(w), Ok(h)) = (
            u32::try_from(self.x),
            u32::try_from(self.y),
            u32::try_from(self.width),
            u32::try_from(self.height),
        ) else {
            return Err(out_of_bounds());
        };
        // u64 相加不会溢出
        if u64::from(x) + u64::from(w) > u64::from(image_width)
            || u64::from(y) + u64::from(h) > u64::from(image_height)
        {
            return Err(out_of_bounds());
        }
        Ok((x, y, w, h))
    }
}

/// 裁剪成功后的 JSON 消息（字段名保持 PascalCase）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CropMessage {
    #[schema(example = "Image cropped successfully")]
    pub message: String,
    #[schema(example = "cropped_image.jpg")]
    pub cropped_image: String,
}

impl CropMessage {
    pub fn success() -> Self {
        Self {
            message: CROP_SUCCESS_MESSAGE.to_string(),
            cropped_image: CROPPED_FILE_NAME.to_string(),
        }
    }
}
