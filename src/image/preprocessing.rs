use crate::config::PreprocessConfig;
use crate::utils::error::VisionError;
use crate::Result;
use image::{imageops, DynamicImage, GrayImage, Luma};
use ndarray::Array4;

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 分类器预处理流水线：灰度 -> 反色 -> 缩放 -> 归一化，输出 (1, H, W, 1)
    pub fn preprocess_for_classifier(
        image: &DynamicImage,
        config: &PreprocessConfig,
    ) -> Result<Array4<f32>> {
        if config.target_size == 0 {
            return Err(VisionError::ImageProcessing(
                "Target size must be positive".to_string(),
            ));
        }

        let mut gray = Self::to_grayscale(image);

        if config.invert {
            imageops::invert(&mut gray);
        }

        let resized = imageops::resize(&gray, config.target_size, config.target_size, config.filter);

        Self::to_tensor(&resized)
    }

    /// ITU-R 601-2 亮度转换，忽略alpha通道
    pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        GrayImage::from_fn(width, height, |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            // L = R * 299/1000 + G * 587/1000 + B * 114/1000，定点运算并四舍五入
            let luma = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
            Luma([luma.min(255) as u8])
        })
    }

    /// 转换为NHWC张量并缩放到[0,1]
    fn to_tensor(gray: &GrayImage) -> Result<Array4<f32>> {
        let (width, height) = gray.dimensions();
        let data: Vec<f32> = gray.as_raw().iter().map(|&v| v as f32 / 255.0).collect();

        Array4::from_shape_vec((1, height as usize, width as usize, 1), data)
            .map_err(|e| VisionError::ImageProcessing(format!("Failed to build tensor: {}", e)))
    }
}
