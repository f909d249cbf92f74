//! 写真のエンコード（base64データURI用）
//!
//! - DownscaleEncoder: 幅を縮小してJPEG再圧縮
//! - RawEncoder: 元ファイルのバイト列をそのままbase64化

use crate::config::{Config, EncoderKind};
use crate::error::{InventoryError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use field_inventory_common::PhotoCell;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

pub trait ImageEncoder: Send + Sync {
    /// path はMIME判定とエラー表示にのみ使う
    fn encode(&self, bytes: &[u8], path: &str) -> Result<PhotoCell>;
}

pub fn image_encoder(config: &Config) -> Box<dyn ImageEncoder> {
    match config.image_encoder {
        EncoderKind::Downscale => Box::new(DownscaleEncoder::new(config.thumbnail_width, config.jpeg_quality)),
        EncoderKind::Raw => Box::new(RawEncoder),
    }
}

pub struct DownscaleEncoder {
    max_width: u32,
    quality: u8,
}

impl DownscaleEncoder {
    pub fn new(max_width: u32, quality: u8) -> Self {
        Self {
            max_width: max_width.max(1),
            quality: quality.clamp(1, 100),
        }
    }
}

impl ImageEncoder for DownscaleEncoder {
    fn encode(&self, bytes: &[u8], path: &str) -> Result<PhotoCell> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| InventoryError::Export(format!("画像読み込みエラー {}: {}", path, e)))?;

        let img = if img.width() > self.max_width {
            let height = (img.height() as u64 * self.max_width as u64 / img.width() as u64).max(1) as u32;
            img.resize_exact(self.max_width, height, FilterType::Triangle)
        } else {
            img
        };

        // JPEGはアルファ非対応
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| InventoryError::Export(format!("JPEG変換エラー {}: {}", path, e)))?;

        Ok(PhotoCell::Embedded {
            mime: "image/jpeg".to_string(),
            base64: STANDARD.encode(&buf),
        })
    }
}

pub struct RawEncoder;

impl ImageEncoder for RawEncoder {
    fn encode(&self, bytes: &[u8], path: &str) -> Result<PhotoCell> {
        if bytes.is_empty() {
            return Err(InventoryError::Export(format!("空のファイル: {}", path)));
        }
        Ok(PhotoCell::Embedded {
            mime: mime_for_path(path).to_string(),
            base64: STANDARD.encode(bytes),
        })
    }
}

fn mime_for_path(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_downscale_shrinks_wide_image() {
        let encoder = DownscaleEncoder::new(300, 70);
        let cell = encoder.encode(&png_bytes(600, 400), "wide.png").unwrap();
        let PhotoCell::Embedded { mime, base64 } = cell else {
            panic!("expected embedded image");
        };
        assert_eq!(mime, "image/jpeg");

        let decoded = STANDARD.decode(base64).unwrap();
        let img = image::load_from_memory(&decoded).unwrap();
        assert_eq!(img.width(), 300);
        assert_eq!(img.height(), 200);
    }

    #[test]
    fn test_downscale_keeps_small_image_size() {
        let encoder = DownscaleEncoder::new(300, 70);
        let cell = encoder.encode(&png_bytes(100, 50), "small.png").unwrap();
        let PhotoCell::Embedded { base64, .. } = cell else {
            panic!("expected embedded image");
        };
        let img = image::load_from_memory(&STANDARD.decode(base64).unwrap()).unwrap();
        assert_eq!((img.width(), img.height()), (100, 50));
    }

    #[test]
    fn test_downscale_rejects_non_image() {
        let encoder = DownscaleEncoder::new(300, 70);
        assert!(encoder.encode(b"not an image", "broken.jpg").is_err());
    }

    #[test]
    fn test_raw_encoder() {
        let cell = RawEncoder.encode(b"ABC", "photo.PNG").unwrap();
        assert_eq!(
            cell,
            PhotoCell::Embedded { mime: "image/png".to_string(), base64: "QUJD".to_string() }
        );
        assert!(RawEncoder.encode(b"", "photo.jpg").is_err());
    }
}
