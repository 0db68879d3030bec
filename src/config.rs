//! Batch-wide configuration: the default target, the exclusion set and
//! per-file target overrides.
//!
//! The loaders never fail on bad content. Malformed entries are dropped and
//! reported back as [`ConfigWarning`]s for the caller to log.

use crate::constants::{CONFIG_FILE_NAME, EXCLUDE_FILE_NAME};
use crate::error::{CompressionError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub source: PathBuf,
    pub message: String,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source.display(), self.message)
    }
}

/// Read once at batch start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    default_target_kb: u64,
    excluded: HashSet<String>,
    overrides: HashMap<String, u64>,
}

impl BatchConfig {
    pub fn new(
        default_target_kb: u64,
        excluded: HashSet<String>,
        overrides: HashMap<String, u64>,
    ) -> Result<Self> {
        if default_target_kb == 0 {
            return Err(CompressionError::InvalidTargetSize(default_target_kb));
        }
        Ok(Self {
            default_target_kb,
            excluded,
            overrides,
        })
    }

    pub fn with_default_target(default_target_kb: u64) -> Result<Self> {
        Self::new(default_target_kb, HashSet::new(), HashMap::new())
    }

    pub fn default_target_kb(&self) -> u64 {
        self.default_target_kb
    }

    pub fn excluded(&self) -> &HashSet<String> {
        &self.excluded
    }

    pub fn overrides(&self) -> &HashMap<String, u64> {
        &self.overrides
    }

    /// Exact filename match against the exclusion set.
    pub fn is_excluded(&self, filename: &str) -> bool {
        self.excluded.contains(filename)
    }

    /// Target size for `filename`: its override when present, otherwise the
    /// batch default.
    pub fn resolve_target(&self, filename: &str) -> u64 {
        self.overrides
            .get(filename)
            .copied()
            .unwrap_or(self.default_target_kb)
    }
}

/// Where the optional config files are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSources {
    pub exclude_file: PathBuf,
    pub override_file: PathBuf,
}

impl ConfigSources {
    /// The conventional `exclude.txt` / `config.csv` next to the images.
    pub fn in_dir(input_dir: &Path) -> Self {
        Self {
            exclude_file: input_dir.join(EXCLUDE_FILE_NAME),
            override_file: input_dir.join(CONFIG_FILE_NAME),
        }
    }

    /// Loads both files and builds the batch configuration.
    ///
    /// Only an invalid default target is an error; unreadable or malformed
    /// files degrade to warnings.
    pub fn load(&self, default_target_kb: u64) -> Result<(BatchConfig, Vec<ConfigWarning>)> {
        let mut warnings = Vec::new();
        let excluded = load_exclusion_list(&self.exclude_file, &mut warnings);
        let overrides = load_target_overrides(&self.override_file, &mut warnings);
        let config = BatchConfig::new(default_target_kb, excluded, overrides)?;
        Ok((config, warnings))
    }
}

/// One filename per line; blank lines are ignored and entries are trimmed.
pub fn parse_exclusion_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_exclusion_list(path: &Path, warnings: &mut Vec<ConfigWarning>) -> HashSet<String> {
    if !path.exists() {
        info!("No exclusion file found at {}", path.display());
        return HashSet::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => parse_exclusion_list(&content),
        Err(e) => {
            warnings.push(ConfigWarning {
                source: path.to_path_buf(),
                message: format!("could not read exclusion list: {}", e),
            });
            HashSet::new()
        }
    }
}

#[derive(Debug, Deserialize)]
struct OverrideRow {
    filename: String,
    target_kb: String,
}

/// Parses a `filename,target_kb` table.
///
/// Rows whose `target_kb` is not a positive integer are skipped with a
/// warning. A later row for the same filename replaces an earlier one.
pub fn parse_target_overrides(
    content: &str,
    source: &Path,
    warnings: &mut Vec<ConfigWarning>,
) -> HashMap<String, u64> {
    let mut overrides = HashMap::new();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    for (index, row) in reader.deserialize::<OverrideRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warnings.push(ConfigWarning {
                    source: source.to_path_buf(),
                    message: format!("line {}: skipping unreadable row: {}", line, e),
                });
                continue;
            }
        };

        let problem = match row.target_kb.parse::<i64>() {
            Ok(target_kb) if target_kb > 0 => {
                overrides.insert(row.filename, target_kb.unsigned_abs());
                continue;
            }
            Ok(_) => "non-positive target_kb",
            Err(_) => "target_kb is not an integer",
        };
        warnings.push(ConfigWarning {
            source: source.to_path_buf(),
            message: format!(
                "line {}: {} ({:?}) for {}, skipping",
                line, problem, row.target_kb, row.filename
            ),
        });
    }

    overrides
}

pub fn load_target_overrides(
    path: &Path,
    warnings: &mut Vec<ConfigWarning>,
) -> HashMap<String, u64> {
    if !path.exists() {
        info!("No config file found at {}", path.display());
        return HashMap::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => parse_target_overrides(&content, path, warnings),
        Err(e) => {
            warnings.push(ConfigWarning {
                source: path.to_path_buf(),
                message: format!("could not read override table: {}", e),
            });
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_zero_default_target_is_rejected() {
        let result = BatchConfig::with_default_target(0);
        assert!(matches!(result, Err(CompressionError::InvalidTargetSize(0))));
    }

    #[test]
    fn test_resolve_target_prefers_override() {
        let overrides = HashMap::from([("hero.jpg".to_string(), 500)]);
        let config = BatchConfig::new(250, HashSet::new(), overrides).unwrap();

        assert_eq!(config.resolve_target("hero.jpg"), 500);
        assert_eq!(config.resolve_target("other.jpg"), 250);
        // Matching is exact.
        assert_eq!(config.resolve_target("HERO.jpg"), 250);
    }

    #[test]
    fn test_parse_exclusion_list() {
        let excluded = parse_exclusion_list("a.jpg\n\n  b.png  \r\na.jpg\n   \n");
        assert_eq!(excluded.len(), 2);
        assert!(excluded.contains("a.jpg"));
        assert!(excluded.contains("b.png"));
    }

    #[test]
    fn test_parse_target_overrides() {
        let mut warnings = Vec::new();
        let content = "filename,target_kb\nhero.jpg,500\n banner.png , 120 \nbad.jpg,abc\nzero.jpg,0\nhero.jpg,600\n";
        let overrides = parse_target_overrides(content, Path::new("config.csv"), &mut warnings);

        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides["hero.jpg"], 600);
        assert_eq!(overrides["banner.png"], 120);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("bad.jpg"));
        assert!(warnings[0].message.contains("line 4"));
        assert!(warnings[0].message.contains("not an integer"));
        assert!(warnings[1].message.contains("zero.jpg"));
        assert!(warnings[1].message.contains("non-positive"));
    }

    #[test]
    fn test_negative_target_is_non_positive() {
        let mut warnings = Vec::new();
        let content = "filename,target_kb\nneg.jpg,-20\n";
        let overrides = parse_target_overrides(content, Path::new("config.csv"), &mut warnings);

        assert!(overrides.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("line 2: non-positive target_kb"));
    }

    #[test]
    fn test_parse_target_overrides_short_row() {
        let mut warnings = Vec::new();
        let content = "filename,target_kb\nlonely.jpg\nok.jpg,10\n";
        let overrides = parse_target_overrides(content, Path::new("config.csv"), &mut warnings);

        assert_eq!(overrides.len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_missing_files_give_empty_config() {
        let temp_dir = TempDir::new().unwrap();
        let (config, warnings) = ConfigSources::in_dir(temp_dir.path()).load(250).unwrap();

        assert!(config.excluded().is_empty());
        assert!(config.overrides().is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(EXCLUDE_FILE_NAME), "skip.jpg\n").unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "filename,target_kb\nbig.jpg,900\n",
        )
        .unwrap();

        let (config, warnings) = ConfigSources::in_dir(temp_dir.path()).load(100).unwrap();

        assert!(warnings.is_empty());
        assert!(config.is_excluded("skip.jpg"));
        assert_eq!(config.resolve_target("big.jpg"), 900);
        assert_eq!(config.resolve_target("small.jpg"), 100);
    }
}
