use crate::codec::ImageCodec;
use crate::error::Result;
use crate::formats::OutputFormat;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn of(img: &DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Restores the original pixel dimensions of a written output.
///
/// Runs once per task after the search. A repaired file is re-encoded at the
/// same quality and format, and its size is not checked against the budget
/// again.
pub struct ResolutionGuard<'a, C: ImageCodec + ?Sized> {
    codec: &'a C,
}

impl<'a, C: ImageCodec + ?Sized> ResolutionGuard<'a, C> {
    pub fn new(codec: &'a C) -> Self {
        Self { codec }
    }

    /// Returns `true` when the file at `output_path` had to be resized.
    pub fn enforce(
        &self,
        output_path: &Path,
        expected: Resolution,
        format: OutputFormat,
        quality: u8,
    ) -> Result<bool> {
        let written = self.codec.decode(&fs::read(output_path)?)?;
        let actual = Resolution::of(&written);
        if actual == expected {
            return Ok(false);
        }

        warn!(
            path = %output_path.display(),
            %actual,
            %expected,
            "output resolution changed during encoding, restoring"
        );
        let restored = self.codec.resize(&written, expected.width, expected.height);
        let bytes = self.codec.encode(&restored, format, quality)?;
        fs::write(output_path, bytes)?;
        Ok(true)
    }
}
