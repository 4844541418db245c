/// Errors that can occur while fitting a mass calibration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    /// Reference and observed peak lists differ in length
    #[error("Known peak lists differ in length: {reference} reference vs {observed} observed")]
    LengthMismatch {
        /// Number of reference peaks
        reference: usize,
        /// Number of observed peaks
        observed: usize,
    },

    /// A known peak is NaN or infinite
    #[error("Known peak #{index} is not finite")]
    NonFinite {
        /// Position in the peak list
        index: usize,
    },

    /// Not enough distinct reference masses to determine a quadratic
    #[error("A quadratic calibration needs at least 3 distinct reference peaks, got {distinct}")]
    TooFewPoints {
        /// Number of distinct reference masses
        distinct: usize,
    },

    /// Options are outside their usable range
    #[error("Invalid calibration options: {0}")]
    InvalidOptions(String),

    /// The least-squares system could not be solved
    #[error("Degenerate quadratic fit: {0}")]
    Degenerate(String),

    /// No RANSAC trial produced a usable consensus set
    #[error("RANSAC found no consensus after {trials} trials")]
    NoConsensus {
        /// Trials attempted
        trials: usize,
    },
}
