use crate::utils::error::VisionError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// 上传文件允许的MIME类型（jpg / jpeg / png）
pub const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str, max_bytes: usize) -> Result<DynamicImage> {
        // 移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = match base64_data.trim().strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => base64_data.trim(),
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean)?;

        Self::from_bytes(&image_bytes, max_bytes)
    }

    /// 从字节流加载图像，只接受PNG与JPEG
    pub fn from_bytes(bytes: &[u8], max_bytes: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(VisionError::InvalidInput("Empty image data".to_string()));
        }

        if bytes.len() > max_bytes {
            return Err(VisionError::FileTooLarge(bytes.len(), max_bytes));
        }

        let format = Self::detect_format(bytes).ok_or_else(|| {
            VisionError::UnsupportedFormat("unrecognized image data".to_string())
        })?;

        if !Self::is_supported_format(format) {
            return Err(VisionError::UnsupportedFormat(format!("{:?}", format)));
        }

        let image = image::load_from_memory_with_format(bytes, format)?;
        let (width, height) = image.dimensions();
        tracing::debug!("Decoded {:?} image: {}x{}", format, width, height);

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }

    /// 验证上传字段声明的内容类型
    pub fn check_content_type(content_type: &str) -> Result<()> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
            Ok(())
        } else {
            Err(VisionError::UnsupportedFormat(content_type.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_REQUEST_SIZE;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 6, Rgb([200, 10, 10]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn decodes_png_and_jpeg() {
        for format in [ImageFormat::Png, ImageFormat::Jpeg] {
            let image = ImageLoader::from_bytes(&encode(format), DEFAULT_MAX_REQUEST_SIZE).unwrap();
            assert_eq!(image.dimensions(), (8, 6));
        }
    }

    #[test]
    fn rejects_other_formats() {
        let err = ImageLoader::from_bytes(&encode(ImageFormat::Bmp), DEFAULT_MAX_REQUEST_SIZE).unwrap_err();
        assert!(matches!(err, VisionError::UnsupportedFormat(_)));

        let err = ImageLoader::from_bytes(b"definitely not an image", DEFAULT_MAX_REQUEST_SIZE).unwrap_err();
        assert!(matches!(err, VisionError::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_empty_and_oversized_payloads() {
        let err = ImageLoader::from_bytes(&[], DEFAULT_MAX_REQUEST_SIZE).unwrap_err();
        assert!(matches!(err, VisionError::InvalidInput(_)));

        let png = encode(ImageFormat::Png);
        let err = ImageLoader::from_bytes(&png, 16).unwrap_err();
        assert!(matches!(err, VisionError::FileTooLarge(len, 16) if len == png.len()));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let png = encode(ImageFormat::Png);
        let err = ImageLoader::from_bytes(&png[..png.len() / 2], DEFAULT_MAX_REQUEST_SIZE).unwrap_err();
        assert!(matches!(err, VisionError::ImageDecode(_)));
    }

    #[test]
    fn base64_accepts_data_url_prefix() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(encode(ImageFormat::Png));
        let plain = ImageLoader::from_base64(&encoded, DEFAULT_MAX_REQUEST_SIZE).unwrap();
        let prefixed = ImageLoader::from_base64(
            &format!("data:image/png;base64,{}", encoded),
            DEFAULT_MAX_REQUEST_SIZE,
        )
        .unwrap();
        assert_eq!(plain.dimensions(), prefixed.dimensions());

        let err = ImageLoader::from_base64("!!not base64!!", DEFAULT_MAX_REQUEST_SIZE).unwrap_err();
        assert!(matches!(err, VisionError::Base64(_)));
    }

    #[test]
    fn content_type_filter() {
        assert!(ImageLoader::check_content_type("image/png").is_ok());
        assert!(ImageLoader::check_content_type("image/JPEG").is_ok());
        assert!(ImageLoader::check_content_type("image/jpg; charset=binary").is_ok());
        assert!(ImageLoader::check_content_type("image/gif").is_err());
        assert!(ImageLoader::check_content_type("text/plain").is_err());
    }
}
