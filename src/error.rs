use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Invalid quality search range: start {start}, min {min}, step {step}")]
    InvalidSearchRange { start: u8, min: u8, step: u8 },

    #[error("Invalid target size: {0} KB. Must be a positive number")]
    InvalidTargetSize(u64),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(PathBuf),

    #[error("Output {} was already written for {owner}", .path.display())]
    OutputCollision { path: PathBuf, owner: String },

    #[error("Input directory not found: {0}")]
    InputDirectoryNotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Report write error: {0}")]
    ReportWrite(#[from] csv::Error),
}

impl CompressionError {
    /// Errors that stop a batch before any task runs.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CompressionError::InputDirectoryNotFound(_)
                | CompressionError::NotADirectory(_)
                | CompressionError::DirectoryCreationFailed(_)
                | CompressionError::InvalidTargetSize(_)
                | CompressionError::InvalidQuality(_)
                | CompressionError::InvalidSearchRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
