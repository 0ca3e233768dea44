use crate::{utils::error::VisionError, web::AppState};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRef, FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::Deserialize;

/// 验证的JSON提取器
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: for<'de> Deserialize<'de> + Validate,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = VisionError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let max_bytes = AppState::from_ref(state).config().server_config.max_request_size;

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| json_error(err, max_bytes))?;

        value.validate()
            .map_err(|msg| VisionError::InvalidInput(format!("Validation error: {}", msg)))?;

        Ok(ValidatedJson(value))
    }
}

fn json_error(err: JsonRejection, max_bytes: usize) -> VisionError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        VisionError::RequestTooLarge(max_bytes)
    } else {
        VisionError::InvalidInput(format!("JSON parse error: {}", err.body_text()))
    }
}

/// 验证trait
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// 为分类请求实现验证
impl Validate for crate::web::handlers::ClassifyJsonRequest {
    fn validate(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("Image data cannot be empty".to_string());
        }

        Ok(())
    }
}

/// 请求ID提取器，优先使用 X-Request-ID 头
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("X-Request-ID")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= 128)
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(RequestId(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::handlers::ClassifyJsonRequest;
    use axum::http::Request as HttpRequest;

    #[test]
    fn blank_image_fails_validation() {
        let request = ClassifyJsonRequest { image: "   ".into() };
        assert!(request.validate().is_err());

        let request = ClassifyJsonRequest { image: "aGVsbG8=".into() };
        assert!(request.validate().is_ok());
    }

    #[tokio::test]
    async fn request_id_prefers_header() {
        let (mut parts, _) = HttpRequest::builder()
            .header("X-Request-ID", "abc-123")
            .body(())
            .unwrap()
            .into_parts();
        let RequestId(id) = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id, "abc-123");
    }

    #[tokio::test]
    async fn request_id_is_generated_when_missing() {
        let (mut parts, _) = HttpRequest::builder().body(()).unwrap().into_parts();
        let RequestId(id) = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
