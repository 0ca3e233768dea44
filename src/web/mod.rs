pub mod handlers;
pub mod middleware;
pub mod extractors;
pub mod ui;

use crate::{
    image::loader::ACCEPTED_CONTENT_TYPES,
    models::{ModelManager, CLASS_NAMES},
    utils::error::VisionError,
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelManager>,
}

impl AppState {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }

    pub fn config(&self) -> &Config {
        self.models.config()
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 初始化模型管理器（只加载一次，失败后不重试）
    let models = ModelManager::init(config.clone());
    if let Some(message) = models.load_error() {
        tracing::warn!("Serving without a model: {}", message);
    }

    let app = create_app(AppState::new(models));

    let addr: SocketAddr = config.bind_addr
        .parse()
        .map_err(|e| VisionError::Config(
            format!("Invalid bind address {}: {}", config.bind_addr, e)
        ))?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /classify        - JSON base64 upload");
    tracing::info!("  POST /classify/upload - Multipart file upload");
    tracing::info!("  GET  /                - Web UI");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/info        - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| VisionError::Internal(
            format!("Failed to bind to address {}: {}", addr, e)
        ))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| VisionError::Internal(
            format!("Server failed to start: {}", e)
        ))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config().server_config.clone();
    let dev_mode = state.config().dev_mode;

    let mut app = Router::new()
        // 分类API路由
        .route("/classify", post(handlers::classify_json_handler))
        .route("/classify/upload", post(handlers::classify_upload_handler))

        // Web UI路由
        .route("/", get(ui::index_handler))

        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))

        // 超限由提取器报告，统一转换为 413 FILE_TOO_LARGE
        .layer(DefaultBodyLimit::max(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging));

    if dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.models.health_check()?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.models.get_stats();

    Json(json!({
        "service": "RetailVision Auto-Tagger",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "labels": CLASS_NAMES,
        "accepted_types": ACCEPTED_CONTENT_TYPES,
        "model": stats,
        "model_error": state.models.load_error(),
    }))
}
