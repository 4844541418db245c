//! TOML configuration for the export and correlation workflows.
//!
//! Every setting that used to be a hard-coded dictionary is a field of an
//! explicit record here. Required fields default to empty during parsing so
//! that [`validate`](ExportConfig::validate) can report all problems at once
//! instead of stopping at the first missing key.

mod correlate;
mod error;
mod export;


use std::path::{Path, PathBuf};

pub use correlate::{CorrelateConfig, CorrelateSettings, SampleConfig};
pub use error::ConfigError;
pub use export::{ColumnKey, ExportConfig, ExportSettings, FileConfig};

/// Default session-open timeout of the export workflow, in seconds
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 300;

/// Default session-open timeout of the correlation workflow, in seconds
pub const DEFAULT_CORRELATE_TIMEOUT_SECS: u64 = 30;

pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve `path` against the directory holding the configuration file
pub(crate) fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() || path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

pub(crate) fn base_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
