use crate::models::{labels::NUM_CLASSES, Classifier, Predictor};
use crate::utils::error::VisionError;
use crate::{Config, Result};
use ndarray::Array4;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// 模型加载结果：要么可用，要么保存面向用户的失败信息（不重试）
enum ModelState {
    Ready(Arc<dyn Predictor>),
    Unavailable(String),
}

/// 模型管理器，进程内只加载一次
pub struct ModelManager {
    state: ModelState,
    config: Config,
}

static MODEL_MANAGER: OnceCell<Arc<ModelManager>> = OnceCell::new();

impl ModelManager {
    /// 初始化全局模型管理器；重复调用返回第一次的结果
    pub fn init(config: Config) -> Arc<ModelManager> {
        Arc::clone(MODEL_MANAGER.get_or_init(|| Arc::new(Self::load(config))))
    }

    /// 加载模型并做一次预热推理，失败时记录错误而不是中断进程
    pub fn load(config: Config) -> Self {
        tracing::info!("Initializing model manager...");

        let state = match Classifier::new(&config).and_then(|classifier| {
            let predictor: Arc<dyn Predictor> = Arc::new(classifier);
            Self::warm_up(predictor.as_ref(), &config)?;
            Ok(predictor)
        }) {
            Ok(predictor) => {
                tracing::info!("Model manager initialized successfully");
                ModelState::Ready(predictor)
            }
            Err(e) => {
                tracing::error!("Model unavailable, classification disabled: {}", e);
                ModelState::Unavailable(Self::user_message(&config, &e))
            }
        };

        Self { state, config }
    }

    /// 使用外部提供的推理实现
    pub fn with_predictor(config: Config, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            state: ModelState::Ready(predictor),
            config,
        }
    }

    /// 用全零输入验证输出维度
    fn warm_up(predictor: &dyn Predictor, config: &Config) -> Result<()> {
        let size = config.preprocess.target_size as usize;
        let probe = Array4::<f32>::zeros((1, size, size, 1));
        let scores = predictor.predict(&probe)?;

        if scores.len() != NUM_CLASSES {
            return Err(VisionError::ModelLoad(format!(
                "Model produced {} scores, expected {}",
                scores.len(),
                NUM_CLASSES
            )));
        }

        tracing::debug!("Warm-up inference succeeded");
        Ok(())
    }

    fn user_message(config: &Config, error: &VisionError) -> String {
        let path = config.model_path().display();
        if config.model_path().exists() {
            format!("Model could not be loaded from '{}': {}", path, error)
        } else {
            format!("Model not found. Please ensure '{}' is available.", path)
        }
    }

    /// 获取推理实现；模型不可用时返回加载错误
    pub fn predictor(&self) -> Result<Arc<dyn Predictor>> {
        match &self.state {
            ModelState::Ready(predictor) => Ok(Arc::clone(predictor)),
            ModelState::Unavailable(message) => Err(VisionError::ModelLoad(message.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    /// 模型加载失败时的提示信息
    pub fn load_error(&self) -> Option<&str> {
        match &self.state {
            ModelState::Ready(_) => None,
            ModelState::Unavailable(message) => Some(message),
        }
    }

    /// 获取配置引用
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 模型健康检查
    pub fn health_check(&self) -> Result<()> {
        self.predictor().map(|_| ())
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            ready: self.is_ready(),
            backend: match &self.state {
                ModelState::Ready(predictor) => Some(predictor.name().to_string()),
                ModelState::Unavailable(_) => None,
            },
            model_path: self.config.model_path().display().to_string(),
            num_classes: NUM_CLASSES,
            input_size: self.config.preprocess.target_size,
            invert: self.config.preprocess.invert,
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    pub model_path: String,
    pub num_classes: usize,
    pub input_size: u32,
    pub invert: bool,
    pub intra_threads: usize,
    pub optimization_level: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPredictor(Vec<f32>);

    impl Predictor for FixedPredictor {
        fn predict(&self, _input: &Array4<f32>) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn missing_config() -> Config {
        Config {
            model_path: "missing/vision_model.onnx".into(),
            ..Config::default()
        }
    }

    #[test]
    fn missing_model_leaves_manager_unavailable() {
        let manager = ModelManager::load(missing_config());
        assert!(!manager.is_ready());
        assert_eq!(
            manager.load_error(),
            Some("Model not found. Please ensure 'missing/vision_model.onnx' is available.")
        );
        assert!(matches!(manager.predictor(), Err(VisionError::ModelLoad(_))));
        assert!(manager.health_check().is_err());
        assert!(!manager.get_stats().ready);
    }

    #[test]
    fn corrupt_model_reports_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vision_model.onnx");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let manager = ModelManager::load(Config {
            model_path: path,
            ..Config::default()
        });
        let message = manager.load_error().unwrap();
        assert!(message.starts_with("Model could not be loaded"));
    }

    #[test]
    fn warm_up_rejects_wrong_output_width() {
        let predictor = FixedPredictor(vec![0.5, 0.5]);
        let err = ModelManager::warm_up(&predictor, &Config::default()).unwrap_err();
        assert!(matches!(err, VisionError::ModelLoad(_)));

        let predictor = FixedPredictor(vec![0.1; NUM_CLASSES]);
        assert!(ModelManager::warm_up(&predictor, &Config::default()).is_ok());
    }

    #[test]
    fn injected_predictor_is_ready() {
        let manager = ModelManager::with_predictor(
            Config::default(),
            Arc::new(FixedPredictor(vec![0.1; NUM_CLASSES])),
        );
        assert!(manager.is_ready());
        assert!(manager.load_error().is_none());
        assert!(manager.health_check().is_ok());
        assert_eq!(manager.get_stats().backend.as_deref(), Some("fixed"));
    }

    #[test]
    fn global_manager_initializes_once() {
        let first = ModelManager::init(missing_config());
        let second = ModelManager::init(Config {
            model_path: "another/path.onnx".into(),
            ..Config::default()
        });
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!second.is_ready());
    }
}
