//! Helpers shared by the search, the pipeline and the report.

use crate::constants::BYTES_PER_KB;

pub fn bytes_to_kb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_KB
}

/// True when `bytes` fits into a budget of `target_kb` kilobytes.
pub fn fits_target(bytes: u64, target_kb: u64) -> bool {
    bytes_to_kb(bytes) <= target_kb as f64
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Size reduction relative to the original, as a percentage.
///
/// Positive means the file shrank, negative means it grew. An empty original
/// yields `0.0`.
pub fn calculate_compression_percent(original_bytes: u64, final_bytes: u64) -> f64 {
    if original_bytes == 0 {
        return 0.0;
    }
    100.0 * (1.0 - final_bytes as f64 / original_bytes as f64)
}

/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.2 MB", "512 KB")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= BYTES_PER_KB && unit_index < UNITS.len() - 1 {
        size /= BYTES_PER_KB;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
