use crate::backend::BackendError;
use crate::calibration::CalibrationError;
use crate::config::ConfigError;
use crate::region::RegionError;

/// Errors that abort an export run
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Configuration is unusable
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session could not be opened or queried
    #[error("Backend error for `{file}`: {source}")]
    Backend {
        /// Key of the file being processed
        file: String,
        /// Underlying error
        #[source]
        source: BackendError,
    },

    /// A configured region could not be resolved
    #[error("Region `{region}` of `{file}`: {source}")]
    Region {
        /// Key of the file being processed
        file: String,
        /// Region label
        region: String,
        /// Underlying error
        #[source]
        source: RegionError,
    },

    /// The mass calibration could not be fitted
    #[error("Calibration of `{file}` failed: {source}")]
    Calibration {
        /// Key of the file being processed
        file: String,
        /// Underlying error
        #[source]
        source: CalibrationError,
    },

    /// The configured normalization does not exist in a session
    #[error("Normalization `{name}` not found in `{file}`")]
    NormalizationNotFound {
        /// Key of the file being processed
        file: String,
        /// Normalization display name
        name: String,
    },

    /// The reference peak list has no windows
    #[error("Peak list `{0}` is empty")]
    EmptyPeakList(String),

    /// CSV output failed
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// I/O error during output
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
