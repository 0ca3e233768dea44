use crate::models::{CLASS_NAMES, NUM_CLASSES};
use crate::utils::error::VisionError;
use crate::Result;
use serde::{Deserialize, Serialize};

/// 概率和允许的误差
pub const PROBABILITY_TOLERANCE: f32 = 1e-3;

/// 一次推理的结果，概率与标签按下标对齐
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    label_index: usize,
    probabilities: Vec<f32>,
}

impl Prediction {
    /// 由模型原始输出构造；若输出不是概率分布则先做softmax
    pub fn from_scores(scores: &[f32]) -> Result<Self> {
        if scores.len() != NUM_CLASSES {
            return Err(VisionError::Inference(format!(
                "Expected {} class scores, got {}",
                NUM_CLASSES,
                scores.len()
            )));
        }

        if scores.iter().any(|s| !s.is_finite()) {
            return Err(VisionError::Inference(
                "Model produced non-finite scores".to_string(),
            ));
        }

        let probabilities = if is_distribution(scores) {
            scores.to_vec()
        } else {
            tracing::debug!("Model output is not normalized, applying softmax");
            softmax(scores)
        };

        // 并列时取第一个
        let label_index = probabilities
            .iter()
            .enumerate()
            .fold(0, |best, (i, &p)| if p > probabilities[best] { i } else { best });

        Ok(Self {
            label_index,
            probabilities,
        })
    }

    pub fn label_index(&self) -> usize {
        self.label_index
    }

    pub fn label(&self) -> &'static str {
        CLASS_NAMES[self.label_index]
    }

    /// 最高类别的概率
    pub fn confidence(&self) -> f32 {
        self.probabilities[self.label_index]
    }

    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }
}

fn is_distribution(scores: &[f32]) -> bool {
    let sum: f32 = scores.iter().sum();
    scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() <= PROBABILITY_TOLERANCE
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// 单个类别的概率
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f32,
}

/// 分类接口返回的完整结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResult {
    /// 生成的库存标签
    pub label: String,
    pub label_index: usize,
    /// 置信度 (0.0 - 1.0)
    pub confidence: f32,
    /// 置信度百分比，保留两位小数
    pub confidence_percent: String,
    /// 所有类别的概率，顺序与标签集一致
    pub probabilities: Vec<ClassProbability>,
    /// 处理耗时（秒）
    pub processing_time: f32,
}

impl ClassifyResult {
    pub fn from_prediction(prediction: &Prediction, processing_time: f32) -> Self {
        let probabilities = CLASS_NAMES
            .iter()
            .zip(prediction.probabilities())
            .map(|(label, &probability)| ClassProbability {
                label: label.to_string(),
                probability,
            })
            .collect();

        Self {
            label: prediction.label().to_string(),
            label_index: prediction.label_index(),
            confidence: prediction.confidence(),
            confidence_percent: format!("{:.2}%", prediction.confidence() * 100.0),
            probabilities,
            processing_time,
        }
    }
}
