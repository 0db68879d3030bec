//! Output container handling and the format decision taken before encoding.
//!
//! Only lossy containers are produced: the quality search has nothing to
//! work with on a lossless encoder, so every source is mapped onto JPEG or
//! WebP here.

use crate::error::{CompressionError, Result};
use image::ImageFormat;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Lossy output containers the encoder can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    Jpeg,
    WebP,
}

impl OutputFormat {
    /// Returns the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    /// Maps a file extension onto an output container, case-sensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    pub fn to_image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::WebP => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::WebP => "WEBP",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::WebP),
            _ => Err(CompressionError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Outcome of the format policy for one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDecision {
    pub format: OutputFormat,
    /// Set when a PNG that is already over budget gets converted to JPEG.
    pub forced_conversion: bool,
}

/// Picks the output container for a source image.
///
/// `original` is the container detected from the file contents, `None` when
/// it could not be identified (treated as JPEG).
///
/// - PNG larger than the target is forced to JPEG.
/// - JPEG and WebP keep their container.
/// - Everything else, PNG within budget included, is normalized to JPEG.
pub fn decide_format(
    original: Option<ImageFormat>,
    original_size_kb: f64,
    target_kb: u64,
) -> FormatDecision {
    match original {
        Some(ImageFormat::Png) if original_size_kb > target_kb as f64 => FormatDecision {
            format: OutputFormat::Jpeg,
            forced_conversion: true,
        },
        Some(ImageFormat::WebP) => FormatDecision {
            format: OutputFormat::WebP,
            forced_conversion: false,
        },
        _ => FormatDecision {
            format: OutputFormat::Jpeg,
            forced_conversion: false,
        },
    }
}

/// Name of the output file for `input_path` once encoded as `format`.
///
/// The original name is kept when its extension already names the output
/// container (`.jpeg` stays `.jpeg`); otherwise the stem is kept and the
/// extension becomes the container's.
pub fn output_file_name(input_path: &Path, format: OutputFormat) -> Result<String> {
    let file_name = input_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CompressionError::InvalidFileName(input_path.to_path_buf()))?;

    let current = input_path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_extension);

    if current == Some(format) {
        return Ok(file_name.to_string());
    }

    let stem = input_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| CompressionError::InvalidFileName(input_path.to_path_buf()))?;
    Ok(format!("{}.{}", stem, format.extension()))
}
