use image::ColorType;
use image::codecs::jpeg::JpegEncoder;

use super::types::CropRegion;
use crate::error::CropError;

/// 一次裁剪的产物
#[derive(Debug, Clone)]
pub struct CroppedImage {
    /// JPEG 编码后的字节
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
}

/// 解码 -> 范围检查 -> 裁剪 -> 编码 JPEG。
///
/// 纯 CPU 计算，调用方应放在 `spawn_blocking` 中执行。
pub fn crop_to_jpeg(data: &[u8], region: CropRegion, quality: u8) -> Result<CroppedImage, CropError> {
    let img = image::load_from_memory(data).map_err(|e| CropError::Decode(e.to_string()))?;
    let (source_width, source_height) = (img.width(), img.height());

    // image 的 crop 会静默收缩到源图范围内，这里显式拒绝越界区域
    let (x, y, w, h) = region.fit(source_width, source_height)?;

    // JPEG 不支持透明通道，统一转为 RGB8
    let rgb = img.crop_imm(x, y, w, h).to_rgb8();

    let mut jpeg = Vec::new();
    let mut enc = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    enc.encode(&rgb, w, h, ColorType::Rgb8.into())
        .map_err(|e| CropError::Encode(e.to_string()))?;

    Ok(CroppedImage {
        jpeg,
        width: w,
        height: h,
        source_width,
        source_height,
    })
}
