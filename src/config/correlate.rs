use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::{base_dir, read_file, resolve, ConfigError, DEFAULT_CORRELATE_TIMEOUT_SECS};
use crate::backend::ImageMode;

/// Settings of a correlation run
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelateSettings {
    /// Session path
    #[serde(default)]
    pub session: PathBuf,

    /// Feature list to aggregate
    #[serde(default)]
    pub peak_list: String,

    /// Display name of the normalization applied to ion images
    pub normalization: Option<String>,

    /// Session-open timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Ion image reduction mode
    #[serde(default)]
    pub mode: ImageMode,

    /// Directory receiving CSV copies of the table and matrices
    pub output_dir: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    DEFAULT_CORRELATE_TIMEOUT_SECS
}

/// One column of the correlation table: a region of one sample
#[derive(Debug, Clone, Deserialize)]
pub struct SampleConfig {
    /// Column label (for example `Mouse 1 visium`)
    #[serde(default)]
    pub label: String,

    /// Path of child indices to the node whose subregions are matched
    #[serde(default)]
    pub search_root: Vec<usize>,

    /// Region-name pattern
    #[serde(default)]
    pub pattern: String,
}

/// Root of a correlation configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelateConfig {
    /// Run settings
    pub correlate: CorrelateSettings,

    /// Table columns, in output order
    #[serde(default)]
    pub samples: Vec<SampleConfig>,
}

impl CorrelateConfig {
    /// Load and validate a configuration file.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        let mut config: CorrelateConfig = toml::from_str(&content)?;
        let base = base_dir(path);
        config.correlate.session = resolve(&base, &config.correlate.session);
        config.correlate.output_dir = config
            .correlate
            .output_dir
            .as_deref()
            .map(|dir| resolve(&base, dir));
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: CorrelateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Session-open timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.correlate.timeout_secs)
    }

    /// Check every required setting, collecting all problems
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        let settings = &self.correlate;

        if settings.session.as_os_str().is_empty() {
            problems.push("correlate.session is required".to_string());
        }
        if settings.peak_list.trim().is_empty() {
            problems.push("correlate.peak_list is required".to_string());
        }
        if settings.timeout_secs == 0 {
            problems.push("correlate.timeout_secs must be positive".to_string());
        }
        if self.samples.is_empty() {
            problems.push("at least one [[samples]] entry is required".to_string());
        }

        let mut labels = HashSet::new();
        for (i, sample) in self.samples.iter().enumerate() {
            if sample.label.trim().is_empty() {
                problems.push(format!("samples[{i}].label is required"));
            } else if !labels.insert(sample.label.as_str()) {
                problems.push(format!("samples[{i}].label `{}` is repeated", sample.label));
            }
            if sample.pattern.is_empty() {
                problems.push(format!("samples[{i}].pattern is required"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}
