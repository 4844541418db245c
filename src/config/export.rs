use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::{base_dir, read_file, resolve, ConfigError, DEFAULT_EXPORT_TIMEOUT_SECS};
use crate::backend::ImageMode;
use crate::calibration::{validate_known_peaks, CalibrationOptions};

/// Which midpoint labels an exported peak column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKey {
    /// Midpoint of the calibrated window
    #[default]
    Adjusted,
    /// Midpoint of the reference window, identical across files
    Reference,
}

/// Settings shared by every file of an export run
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSettings {
    /// Feature list loaded from the reference file
    #[serde(default)]
    pub peak_list: String,

    /// Key of the reference entry in `[files]`
    #[serde(default)]
    pub reference: String,

    /// Directory receiving the CSV files
    #[serde(default)]
    pub dest_dir: PathBuf,

    /// Display name of the normalization applied to ion images
    pub normalization: Option<String>,

    /// Session-open timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Column labelling of the output tables
    #[serde(default)]
    pub column_key: ColumnKey,

    /// Path of child indices to the node whose subregions are matched
    #[serde(default = "default_search_root")]
    pub search_root: Vec<usize>,

    /// RANSAC seed
    #[serde(default)]
    pub seed: u64,

    /// Largest calibration residual (Da) of an accepted known peak.
    /// Unset falls back to the median absolute deviation of the observed masses.
    pub residual_threshold: Option<f64>,

    /// Ion image reduction mode
    #[serde(default)]
    pub mode: ImageMode,
}

fn default_timeout() -> u64 {
    DEFAULT_EXPORT_TIMEOUT_SECS
}

fn default_search_root() -> Vec<usize> {
    vec![0]
}

/// Everything the export workflow needs to know about one input file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Session path
    #[serde(default)]
    pub filepath: PathBuf,

    /// Known peak positions, in the same order for every file
    #[serde(default)]
    pub known_peaks: Vec<f64>,

    /// Sample identifier used in output file names
    #[serde(default)]
    pub display_name: String,

    /// Region label to region-name pattern
    #[serde(default)]
    pub regions: BTreeMap<String, String>,

    /// Data type suffix of the output file names
    #[serde(default)]
    pub data_type: String,
}

/// Root of an export configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Shared settings
    pub export: ExportSettings,

    /// Input files by key
    #[serde(default)]
    pub files: BTreeMap<String, FileConfig>,
}

impl ExportConfig {
    /// Load and validate a configuration file.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        let mut config: ExportConfig = toml::from_str(&content)?;
        config.resolve_paths(&base_dir(path));
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ExportConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        self.export.dest_dir = resolve(base, &self.export.dest_dir);
        for file in self.files.values_mut() {
            file.filepath = resolve(base, &file.filepath);
        }
    }

    /// The reference file entry
    pub fn reference_file(&self) -> Option<&FileConfig> {
        self.files.get(&self.export.reference)
    }

    /// Session-open timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.export.timeout_secs)
    }

    /// Calibration fit settings derived from `[export]`
    pub fn calibration_options(&self) -> CalibrationOptions {
        let mut options = CalibrationOptions::with_seed(self.export.seed);
        options.ransac.residual_threshold = self.export.residual_threshold;
        options
    }

    /// Output path for one (file, region) pair
    pub fn output_path(&self, file: &FileConfig, region: &str) -> PathBuf {
        self.export.dest_dir.join(format!(
            "{}{}{}.csv",
            file.display_name, region, file.data_type
        ))
    }

    /// Check every required setting, collecting all problems
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        let settings = &self.export;

        if settings.peak_list.trim().is_empty() {
            problems.push("export.peak_list is required".to_string());
        }
        if settings.dest_dir.as_os_str().is_empty() {
            problems.push("export.dest_dir is required".to_string());
        }
        if settings.timeout_secs == 0 {
            problems.push("export.timeout_secs must be positive".to_string());
        }
        if let Some(threshold) = settings.residual_threshold {
            if !(threshold.is_finite() && threshold > 0.0) {
                problems.push(format!(
                    "export.residual_threshold must be a positive number, got {threshold}"
                ));
            }
        }
        if self.files.is_empty() {
            problems.push("at least one [files.<name>] entry is required".to_string());
        }

        let reference = if settings.reference.trim().is_empty() {
            problems.push("export.reference is required".to_string());
            None
        } else {
            let found = self.reference_file();
            if found.is_none() {
                problems.push(format!(
                    "export.reference `{}` is not a [files] entry",
                    settings.reference
                ));
            }
            found
        };

        for (key, file) in &self.files {
            if file.filepath.as_os_str().is_empty() {
                problems.push(format!("files.{key}.filepath is required"));
            }
            if file.display_name.trim().is_empty() {
                problems.push(format!("files.{key}.display_name is required"));
            }
            if file.regions.is_empty() {
                problems.push(format!("files.{key}.regions must name at least one region"));
            }
            for (label, pattern) in &file.regions {
                if pattern.is_empty() {
                    problems.push(format!("files.{key}.regions.{label} has an empty pattern"));
                }
            }
            if file.known_peaks.is_empty() {
                problems.push(format!("files.{key}.known_peaks is required"));
            } else if let Some(reference) = reference {
                if let Err(e) = validate_known_peaks(&reference.known_peaks, &file.known_peaks) {
                    problems.push(format!("files.{key}.known_peaks: {e}"));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}
