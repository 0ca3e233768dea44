use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Request body too large, max allowed: {0} bytes")]
    RequestTooLarge(usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl VisionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            VisionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            VisionError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            VisionError::RequestTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            VisionError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            VisionError::Base64(_) => StatusCode::BAD_REQUEST,
            VisionError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            VisionError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            VisionError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            VisionError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            VisionError::Inference(_) => "INFERENCE_ERROR",
            VisionError::InvalidInput(_) => "INVALID_INPUT",
            VisionError::FileTooLarge(_, _) | VisionError::RequestTooLarge(_) => "FILE_TOO_LARGE",
            VisionError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            VisionError::Config(_) => "CONFIG_ERROR",
            VisionError::Base64(_) => "BASE64_DECODE_ERROR",
            VisionError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            VisionError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for VisionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_load_maps_to_service_unavailable() {
        let err = VisionError::ModelLoad("missing".to_string());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "MODEL_LOAD_ERROR");
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            VisionError::UnsupportedFormat("image/gif".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            VisionError::FileTooLarge(10, 5).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            VisionError::InvalidInput("empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn oversized_request_shares_file_too_large_code() {
        let err = VisionError::RequestTooLarge(1024);
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.error_code(), VisionError::FileTooLarge(2048, 1024).error_code());
        assert_eq!(err.to_string(), "Request body too large, max allowed: 1024 bytes");
    }

    #[test]
    fn inference_failure_is_server_error() {
        let err = VisionError::Inference("bad output".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Inference failed: bad output");
    }
}
