pub const DEFAULT_TARGET_KB: u64 = 250;

pub const DEFAULT_START_QUALITY: u8 = 95;
pub const DEFAULT_MIN_QUALITY: u8 = 10;
pub const DEFAULT_QUALITY_STEP: u8 = 5;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

pub const EXCLUDE_FILE_NAME: &str = "exclude.txt";
pub const CONFIG_FILE_NAME: &str = "config.csv";
pub const REPORT_FILE_NAME: &str = "compression_report.csv";

/// Extensions picked up during discovery. Matching is case-sensitive.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub const BYTES_PER_KB: f64 = 1024.0;

/// Placeholder written into text columns of a failed outcome.
pub const NOT_AVAILABLE: &str = "N/A";

pub const CANCELLED_MESSAGE: &str = "cancelled before processing";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
