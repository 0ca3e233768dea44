use anyhow::{bail, Result};
use image::imageops::FilterType;
use std::path::PathBuf;

/// 默认模型路径
pub const DEFAULT_MODEL_PATH: &str = "models/vision_model.onnx";

/// 默认请求体上限（50MB）
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件路径
    pub model_path: PathBuf,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 图像预处理配置
    pub preprocess: PreprocessConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

/// 预处理参数，默认值与模型训练时的数据分布一致（28x28灰度、深色背景）
#[derive(Debug, Clone, Copy)]
pub struct PreprocessConfig {
    /// 目标边长
    pub target_size: u32,

    /// 是否反转明暗
    pub invert: bool,

    /// 缩放插值算法
    pub filter: FilterType,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_size: 28,
            invert: true,
            filter: FilterType::CatmullRom,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout: 60,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: String,
        invert: bool,
        dev_mode: bool,
    ) -> Result<Self> {
        if bind_addr.trim().is_empty() {
            bail!("bind address must not be empty");
        }
        if model_path.trim().is_empty() {
            bail!("model path must not be empty");
        }

        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 }, // 开发模式更长超时
            ..ServerConfig::default()
        };

        let preprocess = PreprocessConfig {
            invert,
            ..PreprocessConfig::default()
        };

        Ok(Self {
            bind_addr,
            model_path: PathBuf::from(model_path),
            dev_mode,
            onnx_config,
            server_config,
            preprocess,
        })
    }

    /// 获取模型路径
    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8501".to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            dev_mode: false,
            onnx_config: OnnxConfig {
                intra_threads: 1,
                optimization_level: 3,
            },
            server_config: ServerConfig::default(),
            preprocess: PreprocessConfig::default(),
        }
    }
}
