use crate::backend::{BackendError, PeakWindow};
use crate::config::ConfigError;
use crate::region::RegionError;

/// Errors that abort a correlation run
#[derive(Debug, thiserror::Error)]
pub enum CorrelationError {
    /// Configuration is unusable
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session could not be opened or queried
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A sample's region could not be resolved
    #[error("Region of sample `{sample}`: {source}")]
    Region {
        /// Sample label
        sample: String,
        /// Underlying error
        #[source]
        source: RegionError,
    },

    /// The configured normalization does not exist in the session
    #[error("Normalization `{0}` not found")]
    NormalizationNotFound(String),

    /// An ion image could not be retrieved
    #[error("Image of peak {window} for sample `{sample}` failed: {source}")]
    Retrieval {
        /// Sample label
        sample: String,
        /// Peak window queried
        window: PeakWindow,
        /// Underlying error
        #[source]
        source: BackendError,
    },

    /// CSV output failed
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// I/O error during output
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
