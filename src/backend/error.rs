use std::path::PathBuf;
use std::time::Duration;

use super::RegionId;

/// Errors raised by an imaging backend or one of its sessions
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// I/O error while opening a session
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Session bundle could not be decoded
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// No session exists at the given path
    #[error("Session not found: {}", .0.display())]
    SessionNotFound(PathBuf),

    /// Opening the session took longer than allowed
    #[error("Opening {} exceeded the {timeout:?} timeout (took {elapsed:?})", .path.display())]
    Timeout {
        /// Session path
        path: PathBuf,
        /// Allowed time
        timeout: Duration,
        /// Time actually spent
        elapsed: Duration,
    },

    /// The session was already closed
    #[error("Session already closed")]
    SessionClosed,

    /// Session contents are inconsistent
    #[error("Invalid session bundle: {0}")]
    InvalidBundle(String),

    /// Region id is not part of the region tree
    #[error("Unknown region: {0}")]
    UnknownRegion(RegionId),

    /// Region holds no spectra
    #[error("Region {0} contains no spectra")]
    EmptyRegion(RegionId),

    /// Feature list name is not part of the feature table
    #[error("Feature list not found: {0}")]
    FeatureListNotFound(String),

    /// Normalization id is unknown to the session
    #[error("Unknown normalization: {0}")]
    UnknownNormalization(String),

    /// A spectrum lacks a usable factor for the requested normalization
    #[error("Spectrum at ({x}, {y}) has no usable `{normalization}` normalization factor")]
    InvalidNormalization {
        /// Pixel x position
        x: u32,
        /// Pixel y position
        y: u32,
        /// Normalization id
        normalization: String,
    },

    /// Mass window bounds are not usable
    #[error("Invalid mass window [{mz_low}, {mz_high}]")]
    InvalidWindow {
        /// Lower bound
        mz_low: f64,
        /// Upper bound
        mz_high: f64,
    },

    /// Image retrieval failed inside the backend
    #[error("Image retrieval failed: {0}")]
    Retrieval(String),
}
