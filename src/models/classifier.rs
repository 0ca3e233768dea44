use crate::models::Predictor;
use crate::utils::error::VisionError;
use crate::{Config, Result};
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// 基于ONNX Runtime的服装分类器
pub struct Classifier {
    session: Mutex<Session>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl Classifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.model_path();

        if !model_path.exists() {
            return Err(VisionError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Session::builder()
            .map_err(|e| load_error(model_path, e))?
            .with_optimization_level(optimization_level(config))
            .map_err(|e| load_error(model_path, e))?
            .with_intra_threads(config.onnx_config.intra_threads)
            .map_err(|e| load_error(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(model_path, e))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(VisionError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(VisionError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model ready: input='{}', output='{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl Predictor for Classifier {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let input_tensor = Tensor::from_array(input.clone())
            .map_err(|e| VisionError::Inference(format!("Failed to create tensor: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| VisionError::Inference(format!("ONNX inference failed: {}", e)))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            VisionError::Inference(format!(
                "Classification output '{}' not found",
                self.output_name
            ))
        })?;

        let (shape, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::Inference(format!("Failed to extract tensor: {}", e)))?;
        tracing::trace!("Classification output shape: {:?}", shape);

        Ok(scores.to_vec())
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

fn load_error(model_path: &Path, e: impl std::fmt::Display) -> VisionError {
    VisionError::ModelLoad(format!("Failed to load model {}: {}", model_path.display(), e))
}

fn optimization_level(config: &Config) -> GraphOptimizationLevel {
    match config.onnx_config.optimization_level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
