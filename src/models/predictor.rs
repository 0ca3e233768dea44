use crate::Result;
use ndarray::Array4;

/// 推理接口：输入 (1, H, W, 1) 张量，输出每个类别的原始分数
pub trait Predictor: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>>;

    /// 用于日志与服务信息
    fn name(&self) -> &str;
}
