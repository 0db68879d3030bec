use crate::constants::NOT_AVAILABLE;
use crate::error::{CompressionError, Result};
use crate::processing::CompressionOutcome;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column order of the report. Always written, even with no rows.
pub const REPORT_COLUMNS: [&str; 9] = [
    "filename",
    "success",
    "original_size_kb",
    "final_size_kb",
    "compression_percent",
    "quality_used",
    "resolution",
    "format",
    "error",
];

/// One CSV row, fields in [`REPORT_COLUMNS`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub filename: String,
    pub success: bool,
    pub original_size_kb: f64,
    pub final_size_kb: f64,
    pub compression_percent: f64,
    pub quality_used: u8,
    pub resolution: String,
    pub format: String,
    pub error: String,
}

impl From<&CompressionOutcome> for ReportRow {
    fn from(outcome: &CompressionOutcome) -> Self {
        Self {
            filename: outcome.filename.clone(),
            success: outcome.success,
            original_size_kb: outcome.original_size_kb,
            final_size_kb: outcome.final_size_kb,
            compression_percent: outcome.compression_percent,
            quality_used: outcome.quality_used,
            resolution: outcome
                .resolution
                .map(|r| r.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            format: outcome
                .format
                .map(|f| f.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            error: outcome.error.clone(),
        }
    }
}

/// Accumulates outcome rows in processing order and renders them as CSV.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    rows: Vec<ReportRow>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outcomes(outcomes: &[CompressionOutcome]) -> Self {
        let mut builder = Self::new();
        for outcome in outcomes {
            builder.push(outcome);
        }
        builder
    }

    pub fn push(&mut self, outcome: &CompressionOutcome) {
        self.rows.push(ReportRow::from(outcome));
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(REPORT_COLUMNS)?;
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| CompressionError::Encode(e.to_string()))
    }

    /// Writes the report as UTF-8 CSV, replacing any existing file.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }
}
