use crate::{
    classify::{ClassifyResult, Prediction},
    config::PreprocessConfig,
    image::{ImageLoader, ImagePreprocessor},
    models::ModelManager,
    utils::error::VisionError,
    Result,
};
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;

/// 分类处理流水线：加载 -> 预处理 -> 推理 -> 结果
pub struct ClassificationPipeline;

impl ClassificationPipeline {
    /// 处理base64图像
    pub async fn process_base64(
        manager: Arc<ModelManager>,
        base64_data: String,
    ) -> Result<ClassifyResult> {
        Self::process(manager, move |max_bytes| {
            ImageLoader::from_base64(&base64_data, max_bytes)
        })
        .await
    }

    /// 处理上传的字节流
    pub async fn process_bytes(
        manager: Arc<ModelManager>,
        bytes: axum::body::Bytes,
    ) -> Result<ClassifyResult> {
        Self::process(manager, move |max_bytes| ImageLoader::from_bytes(&bytes, max_bytes)).await
    }

    /// 解码、预处理与推理都在阻塞线程池中执行
    async fn process<F>(manager: Arc<ModelManager>, load: F) -> Result<ClassifyResult>
    where
        F: FnOnce(usize) -> Result<DynamicImage> + Send + 'static,
    {
        let start_time = Instant::now();

        // 模型不可用时直接返回，不解码图像
        manager.predictor()?;

        let prediction = tokio::task::spawn_blocking(move || {
            let config = manager.config();
            let image = load(config.server_config.max_request_size)?;
            Self::classify_image(&manager, &image, &config.preprocess)
        })
        .await
        .map_err(|e| VisionError::Internal(format!("Classification task failed: {}", e)))??;

        let processing_time = start_time.elapsed().as_secs_f32();

        tracing::debug!(
            "Classified as '{}' ({:.2}%) in {:.3}s",
            prediction.label(),
            prediction.confidence() * 100.0,
            processing_time
        );

        Ok(ClassifyResult::from_prediction(&prediction, processing_time))
    }

    /// 同步分类单张图像
    pub fn classify_image(
        manager: &ModelManager,
        image: &DynamicImage,
        preprocess: &PreprocessConfig,
    ) -> Result<Prediction> {
        let predictor = manager.predictor()?;
        let tensor = ImagePreprocessor::preprocess_for_classifier(image, preprocess)?;
        let scores = predictor.predict(&tensor)?;

        Prediction::from_scores(&scores)
    }
}
