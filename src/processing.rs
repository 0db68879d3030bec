use crate::codec::ImageCodec;
use crate::error::{CompressionError, Result};
use crate::formats::{decide_format, output_file_name, FormatDecision, OutputFormat};
use crate::resolution::{Resolution, ResolutionGuard};
use crate::search::{SearchParams, SizeTargetedEncoder};
use crate::utils::{bytes_to_kb, calculate_compression_percent, fits_target, round_to};
use image::{ImageFormat, ImageReader};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One source image, resolved against the batch configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTask {
    pub filename: String,
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub target_kb: u64,
    pub original_size_bytes: u64,
    /// Container detected from the file contents.
    pub source_format: Option<ImageFormat>,
    pub decision: FormatDecision,
}

impl ImageTask {
    /// Probes `source_path` (size and content signature) and applies the
    /// format policy to settle the output format and destination.
    ///
    /// # Arguments
    /// * `source_path` - Image to compress
    /// * `output_dir` - Directory the result is written to
    /// * `target_kb` - Size budget already resolved for this file
    pub fn prepare(source_path: &Path, output_dir: &Path, target_kb: u64) -> Result<Self> {
        let filename = source_file_name(source_path)?;
        let original_size_bytes = fs::metadata(source_path)?.len();
        let source_format = ImageReader::open(source_path)?
            .with_guessed_format()?
            .format();

        let decision = decide_format(source_format, bytes_to_kb(original_size_bytes), target_kb);
        let destination_path = output_dir.join(output_file_name(source_path, decision.format)?);

        Ok(Self {
            filename,
            source_path: source_path.to_path_buf(),
            destination_path,
            target_kb,
            original_size_bytes,
            source_format,
            decision,
        })
    }

    pub fn output_format(&self) -> OutputFormat {
        self.decision.format
    }

    /// True when the source is already stored in the output container.
    fn keeps_container(&self) -> bool {
        self.source_format == Some(self.decision.format.to_image_format())
    }
}

/// Result of processing one image. Failures carry zeroed numbers and the
/// error text so every file still gets a complete row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionOutcome {
    pub filename: String,
    pub success: bool,
    pub target_kb: u64,
    pub original_size_kb: f64,
    pub final_size_kb: f64,
    pub quality_used: u8,
    pub compression_percent: f64,
    pub resolution: Option<Resolution>,
    pub format: Option<OutputFormat>,
    pub error: String,
    pub output_path: Option<PathBuf>,
    pub attempts: usize,
    pub reached_target: bool,
    pub forced_conversion: bool,
    pub resolution_restored: bool,
    /// The source was smaller than the accepted re-encode and was written
    /// unchanged.
    pub kept_original: bool,
}

impl CompressionOutcome {
    pub fn failed(filename: impl Into<String>, target_kb: u64, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            success: false,
            target_kb,
            original_size_kb: 0.0,
            final_size_kb: 0.0,
            quality_used: 0,
            compression_percent: 0.0,
            resolution: None,
            format: None,
            error: error.into(),
            output_path: None,
            attempts: 0,
            reached_target: false,
            forced_conversion: false,
            resolution_restored: false,
            kept_original: false,
        }
    }
}

pub fn source_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| CompressionError::InvalidFileName(path.to_path_buf()))
}

/// Runs the whole per-file pipeline: decode, size-targeted search, write,
/// resolution guard.
///
/// Never fails: any error is folded into a failed [`CompressionOutcome`].
pub fn process_task<C: ImageCodec + ?Sized>(
    codec: &C,
    params: SearchParams,
    task: &ImageTask,
) -> CompressionOutcome {
    match run_task(codec, params, task) {
        Ok(outcome) => outcome,
        Err(e) => CompressionOutcome::failed(task.filename.clone(), task.target_kb, e.to_string()),
    }
}

fn run_task<C: ImageCodec + ?Sized>(
    codec: &C,
    params: SearchParams,
    task: &ImageTask,
) -> Result<CompressionOutcome> {
    let img = codec.decode(&fs::read(&task.source_path)?)?;
    let resolution = Resolution::of(&img);
    let format = task.output_format();

    let result = SizeTargetedEncoder::new(codec, params).search(&img, format, task.target_kb)?;
    debug!(
        file = %task.filename,
        attempts = result.attempts.len(),
        quality = result.quality,
        reached_target = result.reached_target,
        "search finished"
    );

    if let Some(parent) = task.destination_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|_| CompressionError::DirectoryCreationFailed(parent.to_path_buf()))?;
    }

    // A source that already fits and is smaller than the accepted encoding
    // is written as-is. An exhausted sweep always writes its last attempt.
    let kept_original = result.reached_target
        && task.keeps_container()
        && task.original_size_bytes < result.size_bytes()
        && fits_target(task.original_size_bytes, task.target_kb);

    let resolution_restored = if kept_original {
        if task.source_path != task.destination_path {
            fs::copy(&task.source_path, &task.destination_path)?;
        }
        false
    } else {
        fs::write(&task.destination_path, &result.bytes)?;
        ResolutionGuard::new(codec).enforce(
            &task.destination_path,
            resolution,
            format,
            result.quality,
        )?
    };

    let final_size_bytes = fs::metadata(&task.destination_path)?.len();

    Ok(CompressionOutcome {
        filename: task.filename.clone(),
        success: true,
        target_kb: task.target_kb,
        original_size_kb: round_to(bytes_to_kb(task.original_size_bytes), 2),
        final_size_kb: round_to(bytes_to_kb(final_size_bytes), 2),
        quality_used: result.quality,
        compression_percent: round_to(
            calculate_compression_percent(task.original_size_bytes, final_size_bytes),
            1,
        ),
        resolution: Some(resolution),
        format: Some(format),
        error: String::new(),
        output_path: Some(task.destination_path.clone()),
        attempts: result.attempts.len(),
        reached_target: result.reached_target,
        forced_conversion: task.decision.forced_conversion,
        resolution_restored,
        kept_original,
    })
}
