//! Decode / encode / resize primitives used by the search and the resolution guard.
//!
//! The pipeline never talks to an encoder directly; it goes through
//! [`ImageCodec`] so the search can be driven by any backend.

use crate::constants::{MAX_QUALITY, MIN_QUALITY};
use crate::error::{CompressionError, Result};
use crate::formats::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

pub trait ImageCodec {
    /// Encodes `img` into `format` at `quality` (1-100), returning the file bytes.
    fn encode(&self, img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>>;

    /// Decodes a complete encoded file.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage>;

    /// Resamples `img` to exactly `width` x `height`.
    fn resize(&self, img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        img.resize_exact(width, height, FilterType::Lanczos3)
    }
}

/// Codec backed by the `image` crate for JPEG and libwebp for lossy WebP.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        // JPEG has no alpha channel.
        let rgb = img.to_rgb8();
        let mut buffer = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            encoder.encode_image(&rgb)?;
        }
        Ok(buffer)
    }

    fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
        let rgba = img.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
        let memory = encoder
            .encode_simple(false, quality as f32)
            .map_err(|e| CompressionError::Encode(format!("libwebp failed: {:?}", e)))?;
        if memory.is_empty() {
            return Err(CompressionError::Encode(format!(
                "libwebp produced no output for a {}x{} image",
                rgba.width(),
                rgba.height()
            )));
        }
        Ok(memory.to_vec())
    }
}

impl ImageCodec for ImageCrateCodec {
    fn encode(&self, img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(CompressionError::InvalidQuality(quality));
        }
        match format {
            OutputFormat::Jpeg => Self::encode_jpeg(img, quality),
            OutputFormat::WebP => Self::encode_webp(img, quality),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage> {
        Ok(image::load_from_memory(bytes)?)
    }
}
