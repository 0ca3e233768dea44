use crate::{
    classify::{ClassificationPipeline, ClassifyResult},
    image::ImageLoader,
    utils::error::VisionError,
    web::{
        extractors::{RequestId, ValidatedJson},
        AppState,
    },
    Result,
};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct ClassifyJsonRequest {
    /// Base64编码的图像数据，可带data URL前缀
    pub image: String,
}

/// JSON响应格式，错误由 VisionError 的 IntoResponse 统一输出
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// JSON base64上传处理器
pub async fn classify_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ClassifyJsonRequest>,
) -> Result<Json<ApiResponse<ClassifyResult>>> {
    let start_time = Instant::now();

    tracing::info!(
        "Processing JSON classify request: request_id={}, payload={} chars",
        request_id,
        request.image.len()
    );

    let result = ClassificationPipeline::process_base64(state.models.clone(), request.image).await?;

    tracing::info!(
        "JSON classify completed: request_id={}, label={}, confidence={}, time={:.3}s",
        request_id,
        result.label,
        result.confidence_percent,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}

/// Multipart文件上传处理器
pub async fn classify_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ClassifyResult>>> {
    let start_time = Instant::now();

    tracing::info!("Processing multipart classify request: request_id={}", request_id);

    let max_bytes = state.config().server_config.max_request_size;
    let mut image_data: Option<axum::body::Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart field", max_bytes))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                // 上传类型限定为 jpg / jpeg / png
                if let Some(content_type) = field.content_type() {
                    ImageLoader::check_content_type(content_type)?;
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read file data", max_bytes))?;

                if data.is_empty() {
                    return Err(VisionError::InvalidInput("Empty file".to_string()));
                }

                tracing::debug!("Received file: {} bytes", data.len());
                image_data = Some(data);
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let image_data = image_data.ok_or_else(|| {
        VisionError::InvalidInput("No image file provided".to_string())
    })?;

    let result = ClassificationPipeline::process_bytes(state.models.clone(), image_data).await?;

    tracing::info!(
        "Upload classify completed: request_id={}, label={}, confidence={}, time={:.3}s",
        request_id,
        result.label,
        result.confidence_percent,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}

/// 请求体超过上限时 multer 返回 413，其余读取错误视为无效输入
fn multipart_error(err: MultipartError, context: &str, max_bytes: usize) -> VisionError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        VisionError::RequestTooLarge(max_bytes)
    } else {
        VisionError::InvalidInput(format!("{}: {}", context, err))
    }
}
