use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageError, RgbImage};
use serde::Serialize;
use thiserror::Error;

/// 初始 JPEG 质量
const START_QUALITY: u8 = 80;
/// 质量下限
pub const QUALITY_FLOOR: u8 = 10;
const QUALITY_STEP: u8 = 10;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("failed to decode image: {0}")]
    ImageDecode(#[source] ImageError),

    #[error("failed to encode jpeg: {0}")]
    ImageEncode(#[source] ImageError),
}

/// 压缩结果
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data: Vec<u8>,
    pub stats: CompressionStats,
}

/// 压缩统计 (原图未处理时 quality/width/height 为空)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionStats {
    pub original_size: usize,
    pub compressed_size: usize,
    pub quality: Option<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub mime: Option<&'static str>,
}

impl CompressionStats {
    pub fn was_compressed(&self) -> bool {
        self.quality.is_some()
    }
}

/// 按体积上限自适应压缩图片
#[derive(Debug, Clone, Copy)]
pub struct ImageCompressor {
    max_size_bytes: usize,
}

impl ImageCompressor {
    pub fn new(max_size_bytes: usize) -> Self {
        Self { max_size_bytes }
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    /// 压缩图片
    ///
    /// 未超过上限时原样返回; 否则按 √(上限/原大小) 缩放尺寸, 从质量 80 开始
    /// 编码为 JPEG, 仍超限则每次降低 10, 降到 10 为止。到达下限后即使仍超限
    /// 也直接返回。
    pub fn compress(&self, input: &[u8]) -> Result<CompressedImage, CompressError> {
        let original_size = input.len();

        if original_size <= self.max_size_bytes {
            return Ok(CompressedImage {
                data: input.to_vec(),
                stats: CompressionStats {
                    original_size,
                    compressed_size: original_size,
                    quality: None,
                    width: None,
                    height: None,
                    mime: image::guess_format(input).ok().map(|f| f.to_mime_type()),
                },
            });
        }

        let decoded = image::load_from_memory(input).map_err(CompressError::ImageDecode)?;
        let (width, height) = decoded.dimensions();

        let scale = scale_factor(original_size, self.max_size_bytes);
        let (target_w, target_h) = scaled_dimensions(width, height, scale);
        tracing::debug!(
            "Resizing {}x{} -> {}x{} (scale {:.3})",
            width, height, target_w, target_h, scale
        );

        // JPEG 不支持透明通道
        let resized = decoded
            .resize_exact(target_w, target_h, FilterType::Triangle)
            .to_rgb8();

        let mut quality = START_QUALITY;
        let data = loop {
            let encoded = encode_jpeg(&resized, quality)?;
            if encoded.len() <= self.max_size_bytes || quality <= QUALITY_FLOOR {
                break encoded;
            }
            quality -= QUALITY_STEP;
        };

        if data.len() > self.max_size_bytes {
            tracing::warn!(
                "Still over ceiling at floor quality {}: {} > {} bytes",
                quality, data.len(), self.max_size_bytes
            );
        }

        tracing::info!(
            "Image compressed: {}KB -> {}KB (quality {})",
            original_size / 1024,
            data.len() / 1024,
            quality
        );

        Ok(CompressedImage {
            stats: CompressionStats {
                original_size,
                compressed_size: data.len(),
                quality: Some(quality),
                width: Some(target_w),
                height: Some(target_h),
                mime: Some("image/jpeg"),
            },
            data,
        })
    }
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_IMAGE_BYTES)
    }
}

/// 线性缩放系数: 像素面积大致按体积比例缩小
pub fn scale_factor(original_size: usize, max_size_bytes: usize) -> f64 {
    (max_size_bytes as f64 / original_size as f64).sqrt()
}

fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = ((width as f64 * scale).floor() as u32).max(1);
    let h = ((height as f64 * scale).floor() as u32).max(1);
    (w, h)
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(image)
        .map_err(CompressError::ImageEncode)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    /// 生成伪随机噪声 PNG (几乎不可压缩)
    fn noise_png(width: u32, height: u32) -> Vec<u8> {
        let mut seed: u32 = 0x1234_5678;
        let img = RgbImage::from_fn(width, height, |_, _| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let [r, g, b, _] = seed.to_le_bytes();
            image::Rgb([r, g, b])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn small_input_passes_through_unchanged() {
        let png = noise_png(16, 16);
        let result = ImageCompressor::new(png.len()).compress(&png).unwrap();

        assert_eq!(result.data, png);
        assert!(!result.stats.was_compressed());
        assert_eq!(result.stats.mime, Some("image/png"));
    }

    #[test]
    fn passthrough_does_not_require_decodable_input() {
        let junk = b"not an image".to_vec();
        let result = ImageCompressor::new(1024).compress(&junk).unwrap();
        assert_eq!(result.data, junk);
    }

    #[test]
    fn oversized_input_converges_or_hits_floor() {
        let png = noise_png(300, 300);
        let max = 40_000;
        assert!(png.len() > max);

        let result = ImageCompressor::new(max).compress(&png).unwrap();
        assert_eq!(&result.data[..2], &[0xFF, 0xD8]);
        assert_eq!(result.stats.mime, Some("image/jpeg"));
        assert!(
            result.data.len() <= max || result.stats.quality == Some(QUALITY_FLOOR),
            "size {} quality {:?}",
            result.data.len(),
            result.stats.quality
        );

        let decoded = image::load_from_memory(&result.data).unwrap();
        let expected = (300.0 * scale_factor(png.len(), max)).floor() as u32;
        assert_eq!(decoded.dimensions(), (expected, expected));
    }

    #[test]
    fn unreachable_ceiling_returns_floor_quality_result() {
        let png = noise_png(64, 64);
        let result = ImageCompressor::new(1).compress(&png).unwrap();

        assert_eq!(result.stats.quality, Some(QUALITY_FLOOR));
        assert!(result.data.len() > 1);
        assert_eq!((result.stats.width, result.stats.height), (Some(1), Some(1)));
    }

    #[test]
    fn undecodable_oversized_input_is_an_error() {
        let junk = vec![0u8; 4096];
        let err = ImageCompressor::new(1024).compress(&junk).unwrap_err();
        assert!(matches!(err, CompressError::ImageDecode(_)));
    }

    #[test]
    fn larger_inputs_get_smaller_scale() {
        let max = 900 * 1024;
        let a = scale_factor(2 * max, max);
        let b = scale_factor(4 * max, max);
        assert!(b < a);
        assert!((b - 0.5).abs() < 1e-9);
        assert_eq!(scaled_dimensions(1000, 800, b), (500, 400));
    }
}
