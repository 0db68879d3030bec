pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod formats;
pub mod logger;
pub mod processing;
pub mod progress;
pub mod report;
pub mod resolution;
pub mod search;
pub mod utils;

pub use batch::{collect_image_files, is_image_file, BatchOrchestrator, BatchSummary};
pub use codec::{ImageCodec, ImageCrateCodec};
pub use config::{BatchConfig, ConfigSources, ConfigWarning};
pub use error::{CompressionError, Result};
pub use formats::{decide_format, output_file_name, FormatDecision, OutputFormat};
pub use processing::{process_task, CompressionOutcome, ImageTask};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use report::{ReportBuilder, ReportRow, REPORT_COLUMNS};
pub use resolution::{Resolution, ResolutionGuard};
pub use search::{EncodingAttempt, SearchParams, SearchResult, SizeTargetedEncoder};
