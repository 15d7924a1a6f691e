use std::collections::HashMap;
use std::time::Instant;

use axum::{
    Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, Query, State, multipart::MultipartRejection,
        rejection::QueryRejection,
    },
    response::Response,
    routing::post,
};

use crate::{
    config::CropConfig,
    error::{AppError, CropError},
    response::{self, FileResponse, JsonResponse, ResponsePartExt},
    state::AppState,
};

use super::service::{self, CroppedImage};
use super::types::{
    CROP_RESULT_HEADER, CROPPED_FILE_NAME, CropMessage, CropQuery, CropRegion, IMAGE_FIELD,
};

/// 从 multipart 中收集到的内容
#[derive(Debug, Default)]
struct CropUpload {
    image: Option<Bytes>,
    /// 表单中的同名参数，优先于 Query
    form: CropQuery,
}

fn parse_int_field(name: &str, raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::BadRequest(format!("{name} 不是合法整数: {raw}")))
}

/// 按参数名（不区分大小写）定位 `CropQuery` 中的槽位，未知参数返回 None。
fn param_slot<'a>(params: &'a mut CropQuery, name: &str) -> Option<&'a mut Option<i32>> {
    match name.to_ascii_lowercase().as_str() {
        "cropx" => Some(&mut params.crop_x),
        "cropy" => Some(&mut params.crop_y),
        "width" => Some(&mut params.width),
        "height" => Some(&mut params.height),
        _ => None,
    }
}

/// Query 参数与表单字段使用同一套名称匹配规则。
fn parse_query(raw: &HashMap<String, String>) -> Result<CropQuery, AppError> {
    let mut query = CropQuery::default();
    for (name, value) in raw {
        match param_slot(&mut query, name) {
            Some(slot) => *slot = Some(parse_int_field(name, value)?),
            None => tracing::debug!("忽略未知查询参数: {}", name),
        }
    }
    Ok(query)
}

async fn read_upload(mut multipart: Multipart) -> Result<CropUpload, AppError> {
    let mut upload = CropUpload::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if name.eq_ignore_ascii_case(IMAGE_FIELD) {
            upload.image = Some(field.bytes().await?);
            continue;
        }
        let Some(slot) = param_slot(&mut upload.form, &name) else {
            tracing::debug!("忽略未知表单字段: {}", name);
            continue;
        };
        let text = field.text().await?;
        *slot = Some(parse_int_field(&name, &text)?);
    }
    Ok(upload)
}

fn resolve_region(query: CropQuery, form: CropQuery) -> CropRegion {
    CropRegion {
        x: form.crop_x.or(query.crop_x).unwrap_or(0),
        y: form.crop_y.or(query.crop_y).unwrap_or(0),
        width: form.width.or(query.width).unwrap_or(0),
        height: form.height.or(query.height).unwrap_or(0),
    }
}

/// 在阻塞线程池中执行裁剪，并受并发许可约束。
async fn run_crop(
    state: &AppState,
    image: Bytes,
    region: CropRegion,
) -> Result<CroppedImage, CropError> {
    let _permit = state
        .crop_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| CropError::Worker(format!("获取裁剪许可失败: {e}")))?;

    let quality = state.crop.jpeg_quality;
    // 解码/编码均为 CPU 密集操作，必须移出 tokio worker。
    tokio::task::spawn_blocking(move || service::crop_to_jpeg(&image, region, quality))
        .await
        .map_err(|e| CropError::Worker(format!("裁剪任务执行失败: {e}")))?
}

#[utoipa::path(
    post,
    path = "/crop",
    summary = "裁剪图片",
    description = "上传图片并按 (cropX, cropY, width, height) 裁剪，返回 JPEG 文件。JSON 结果消息位于响应头 X-Crop-Result。裁剪参数可放在 Query 或表单字段中（表单优先）。",
    params(CropQuery),
    request_body(content = super::types::CropUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "裁剪后的 JPEG 图片", body = String, content_type = "image/jpeg",
            headers(("X-Crop-Result" = String, description = "JSON: {\"Message\", \"CroppedImage\"}"))),
        (status = 400, description = "宽高非法（纯文本）或请求结构错误（ProblemDetails）", body = String),
        (status = 413, description = "上传过大", body = crate::error::ProblemDetails),
        (status = 500, description = "解码/裁剪/编码失败（纯文本）", body = String)
    ),
    tag = "Crop"
)]
pub async fn crop_image(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let Query(raw_query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let query = parse_query(&raw_query)?;
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let upload = read_upload(multipart).await?;
    let image = upload
        .image
        .ok_or_else(|| AppError::MissingField(IMAGE_FIELD.to_string()))?;

    let region = resolve_region(query, upload.form).validate()?;

    let started = Instant::now();
    let upload_len = image.len();
    let cropped = match run_crop(&state, image, region).await {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(?region, upload_len, "图片裁剪失败: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!(
        ?region,
        source = %format!("{}x{}", cropped.source_width, cropped.source_height),
        output_bytes = cropped.jpeg.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "图片裁剪完成"
    );

    let file = FileResponse::new(cropped.jpeg, "image/jpeg").with_file_name(CROPPED_FILE_NAME);
    let message = JsonResponse::in_header(CROP_RESULT_HEADER.clone(), CropMessage::success());
    let outcome = file.combine_with(message);

    Ok(response::render(&outcome).await?)
}

pub fn create_crop_router(cfg: &CropConfig) -> Router<AppState> {
    Router::new()
        .route("/crop", post(crop_image))
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
}
