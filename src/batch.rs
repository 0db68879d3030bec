use crate::codec::{ImageCodec, ImageCrateCodec};
use crate::config::BatchConfig;
use crate::constants::{CANCELLED_MESSAGE, REPORT_FILE_NAME, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::{CompressionError, Result};
use crate::processing::{process_task, CompressionOutcome, ImageTask};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::report::ReportBuilder;
use crate::search::SearchParams;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

/// Aggregate result of one batch run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// One outcome per processed file, in processing order.
    pub outcomes: Vec<CompressionOutcome>,
    pub excluded_count: usize,
    pub elapsed: Duration,
    pub output_dir: PathBuf,
    /// Set when the report was written.
    pub report_path: Option<PathBuf>,
    /// Set when writing the report failed. Completed tasks are unaffected.
    pub report_error: Option<String>,
    pub cancelled: bool,
    /// Warnings raised while loading the exclusion list and override table.
    /// Left at 0 by [`BatchOrchestrator::run`]; the caller that loaded the
    /// configuration fills it in.
    pub config_warnings: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}

/// Runs the per-file pipeline over a directory, one file at a time.
pub struct BatchOrchestrator<C = ImageCrateCodec> {
    codec: C,
    params: SearchParams,
    report_name: String,
    cancel: Option<Arc<AtomicBool>>,
}

impl BatchOrchestrator<ImageCrateCodec> {
    pub fn new(params: SearchParams) -> Self {
        Self::with_codec(ImageCrateCodec, params)
    }
}

impl<C: ImageCodec> BatchOrchestrator<C> {
    pub fn with_codec(codec: C, params: SearchParams) -> Self {
        Self {
            codec,
            params,
            report_name: REPORT_FILE_NAME.to_string(),
            cancel: None,
        }
    }

    /// File name of the report inside the output directory.
    pub fn report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = name.into();
        self
    }

    /// Flag checked before each file. Once set, the remaining files are
    /// recorded as cancelled without being encoded.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Compresses a single file to `target_kb` into `output_dir`.
    pub fn process_file(&self, source: &Path, output_dir: &Path, target_kb: u64) -> CompressionOutcome {
        self.process_unclaimed(source, output_dir, target_kb, &mut HashMap::new())
    }

    /// Like [`Self::process_file`], but refuses a destination that an earlier
    /// successful task in `claimed` already wrote (`a.png` and `a.jpg` both
    /// map to `a.jpg`).
    fn process_unclaimed(
        &self,
        source: &Path,
        output_dir: &Path,
        target_kb: u64,
        claimed: &mut HashMap<PathBuf, String>,
    ) -> CompressionOutcome {
        let task = match ImageTask::prepare(source, output_dir, target_kb) {
            Ok(task) => task,
            Err(e) => {
                return CompressionOutcome::failed(display_name(source), target_kb, e.to_string())
            }
        };

        if let Some(owner) = claimed.get(&task.destination_path) {
            let error = CompressionError::OutputCollision {
                path: task.destination_path.clone(),
                owner: owner.clone(),
            };
            return CompressionOutcome::failed(task.filename, target_kb, error.to_string());
        }

        let outcome = process_task(&self.codec, self.params, &task);
        if outcome.success {
            claimed.insert(task.destination_path, task.filename);
        }
        outcome
    }

    /// Compresses every supported image directly inside `input_dir`.
    ///
    /// Fails only before any file is touched: missing input directory or an
    /// output directory that cannot be created. Per-file errors end up in
    /// the outcomes, a report write error in [`BatchSummary::report_error`].
    pub fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        config: &BatchConfig,
        sink: &dyn ProgressSink,
    ) -> Result<BatchSummary> {
        let start_time = Instant::now();

        let image_files = collect_image_files(input_dir)?;
        fs::create_dir_all(output_dir)
            .map_err(|_| CompressionError::DirectoryCreationFailed(output_dir.to_path_buf()))?;

        let discovered = image_files.len();
        let image_files: Vec<PathBuf> = image_files
            .into_iter()
            .filter(|path| !config.is_excluded(&display_name(path)))
            .collect();
        let excluded_count = discovered - image_files.len();
        let total_files = image_files.len();

        if total_files == 0 {
            info!(
                "No images found in {}. Please add images (jpg, jpeg, png, webp).",
                input_dir.display()
            );
        } else {
            info!("Processing {} images...", total_files);
            info!("Target: {} KB", config.default_target_kb());
            if excluded_count > 0 {
                info!("Excluded: {} files", excluded_count);
            }
        }

        sink.on_event(ProgressEvent::BatchStarted { total: total_files });

        let mut outcomes = Vec::with_capacity(total_files);
        let mut claimed = HashMap::new();
        let mut cancelled = false;

        for (idx, path) in image_files.iter().enumerate() {
            let index = idx + 1;
            let filename = display_name(path);
            let target_kb = config.resolve_target(&filename);

            if !cancelled && self.is_cancelled() {
                warn!(
                    "Cancelled: skipping the remaining {} files",
                    total_files - idx
                );
                cancelled = true;
            }
            sink.on_event(ProgressEvent::TaskStarted {
                index,
                total: total_files,
                filename: filename.clone(),
                target_kb,
            });

            let outcome = if cancelled {
                CompressionOutcome::failed(filename, target_kb, CANCELLED_MESSAGE)
            } else {
                info!("[{}/{}] {} (Target: {} KB)", index, total_files, filename, target_kb);
                let outcome = self.process_unclaimed(path, output_dir, target_kb, &mut claimed);
                log_outcome(&outcome);
                outcome
            };

            sink.on_event(ProgressEvent::TaskFinished {
                index,
                total: total_files,
                outcome: outcome.clone(),
            });
            outcomes.push(outcome);
        }

        let report_file = output_dir.join(&self.report_name);
        let (report_path, report_error) =
            match ReportBuilder::from_outcomes(&outcomes).write_file(&report_file) {
                Ok(()) => {
                    info!("Report saved to: {}", report_file.display());
                    (Some(report_file), None)
                }
                Err(e) => {
                    warn!("Error writing report {}: {}", report_file.display(), e);
                    (None, Some(e.to_string()))
                }
            };

        let summary = BatchSummary {
            outcomes,
            excluded_count,
            elapsed: start_time.elapsed(),
            output_dir: output_dir.to_path_buf(),
            report_path,
            report_error,
            cancelled,
            config_warnings: 0,
        };

        sink.on_event(ProgressEvent::BatchFinished {
            succeeded: summary.succeeded(),
            failed: summary.failed(),
        });
        info!(
            "DONE! {}/{} succeeded in {:.2} seconds.",
            summary.succeeded(),
            summary.total(),
            summary.elapsed.as_secs_f64()
        );
        info!("Output folder: {}", output_dir.display());

        Ok(summary)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

fn log_outcome(outcome: &CompressionOutcome) {
    if outcome.success {
        info!(
            "  {} KB | Quality: {} | Saved {}%",
            outcome.final_size_kb, outcome.quality_used, outcome.compression_percent
        );
        if !outcome.reached_target {
            warn!(
                "  {} stays above {} KB even at the lowest quality",
                outcome.filename, outcome.target_kb
            );
        }
    } else {
        warn!("  Failed: {}", outcome.error);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Lists the supported images directly inside `input_dir`, in the order the
/// filesystem returns them. Hidden files and subdirectories are skipped.
pub fn collect_image_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.exists() {
        return Err(CompressionError::InputDirectoryNotFound(input_dir.to_path_buf()));
    }
    if !input_dir.is_dir() {
        return Err(CompressionError::NotADirectory(input_dir.to_path_buf()));
    }

    let mut image_files = Vec::new();
    let walker = WalkDir::new(input_dir).min_depth(1).max_depth(1).into_iter();

    for entry in walker.filter_entry(|e| e.depth() == 0 || !is_hidden(e)) {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && is_image_file(path) {
            image_files.push(path.to_path_buf());
        }
    }

    Ok(image_files)
}

/// Case-sensitive match on the supported extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_IMAGE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
