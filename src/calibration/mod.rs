//! # Mass-Axis Calibration
//!
//! Maps the reference file's mass axis onto another file's axis using a
//! handful of known peak correspondences, so that a peak list defined on the
//! reference can be queried against every other file.
//!
//! The fit runs in two stages:
//!
//! 1. A degree-2 polynomial RANSAC fit of reference → observed masses that
//!    rejects outlying correspondences.
//! 2. The robust model is sampled densely across the reference mass range
//!    and a plain quadratic `a·mz² + b·mz + c` is refit to that curve by
//!    unweighted least squares.
//!
//! The result is three coefficients; applying a calibration is a single
//! polynomial evaluation ([`adjust_mass`]).
//!
//! ```
//! use msivis::calibration::{adjust_mass, calibrate, CalibrationOptions};
//!
//! let reference = [400.0, 600.0, 800.0, 1000.0];
//! let observed: Vec<f64> = reference.iter().map(|mz| mz * 1.0002 + 0.01).collect();
//!
//! let calibration = calibrate(&reference, &observed, &CalibrationOptions::default())?;
//! assert!((adjust_mass(600.0, &calibration) - observed[1]).abs() < 1e-8);
//! # Ok::<(), msivis::calibration::CalibrationError>(())
//! ```

mod error;
mod polyfit;
mod ransac;

#[cfg(test)]
mod tests;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::backend::PeakWindow;

pub use error::CalibrationError;
pub use ransac::RansacOptions;

/// Number of points the robust model is resampled at before the refit
pub const DEFAULT_DENSE_POINTS: usize = 50;

/// Quadratic mass correction `adjust(mz) = a·mz² + b·mz + c`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Quadratic coefficient
    pub a: f64,
    /// Linear coefficient
    pub b: f64,
    /// Constant offset
    pub c: f64,
}

impl Calibration {
    /// Calibration that leaves masses unchanged
    pub fn identity() -> Self {
        Self {
            a: 0.0,
            b: 1.0,
            c: 0.0,
        }
    }

    /// Evaluate the correction at `mz`
    pub fn adjust(&self, mz: f64) -> f64 {
        self.a * mz * mz + self.b * mz + self.c
    }

    /// Adjust both bounds of a window, keeping them ordered
    pub fn adjust_window(&self, window: &PeakWindow) -> PeakWindow {
        let low = self.adjust(window.mz_low);
        let high = self.adjust(window.mz_high);
        PeakWindow::new(low.min(high), low.max(high))
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::identity()
    }
}

/// Apply a calibration to a single mass
pub fn adjust_mass(mz: f64, calibration: &Calibration) -> f64 {
    calibration.adjust(mz)
}

/// Options of the two-stage calibration fit
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOptions {
    /// Robust estimator settings
    pub ransac: RansacOptions,
    /// Points sampled from the robust model for the refit
    pub dense_points: usize,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            ransac: RansacOptions::default(),
            dense_points: DEFAULT_DENSE_POINTS,
        }
    }
}

impl CalibrationOptions {
    /// Default options with a specific RANSAC seed
    pub fn with_seed(seed: u64) -> Self {
        let mut options = Self::default();
        options.ransac.seed = seed;
        options
    }
}

/// Check a known-peak correspondence before fitting.
///
/// Returns the number of distinct reference masses.
pub fn validate_known_peaks(reference: &[f64], observed: &[f64]) -> Result<usize, CalibrationError> {
    if reference.len() != observed.len() {
        return Err(CalibrationError::LengthMismatch {
            reference: reference.len(),
            observed: observed.len(),
        });
    }
    if let Some(index) = reference
        .iter()
        .chain(observed)
        .position(|v| !v.is_finite())
    {
        return Err(CalibrationError::NonFinite {
            index: index % reference.len().max(1),
        });
    }

    let mut distinct = reference.to_vec();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();
    if distinct.len() < 3 {
        return Err(CalibrationError::TooFewPoints {
            distinct: distinct.len(),
        });
    }
    Ok(distinct.len())
}

/// Fit the calibration mapping `reference` masses onto `observed` masses.
pub fn calibrate(
    reference: &[f64],
    observed: &[f64],
    options: &CalibrationOptions,
) -> Result<Calibration, CalibrationError> {
    validate_known_peaks(reference, observed)?;
    if options.dense_points < 3 {
        return Err(CalibrationError::InvalidOptions(format!(
            "dense_points must be at least 3, got {}",
            options.dense_points
        )));
    }

    let robust = ransac::ransac_quadratic(reference, observed, &options.ransac)?;
    let outliers = reference.len() - robust.inlier_count();
    if outliers > 0 {
        warn!(
            "Calibration rejected {} of {} known peaks as outliers",
            outliers,
            reference.len()
        );
    }

    let (min, max) = reference
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let dense_x = polyfit::linspace(min, max, options.dense_points);
    let dense_y: Vec<f64> = dense_x.iter().map(|&x| robust.model.adjust(x)).collect();
    let calibration = polyfit::fit_quadratic(&dense_x, &dense_y)?;

    debug!(
        "Calibration after {} RANSAC trials: a={:e} b={:.9} c={:.6}",
        robust.trials, calibration.a, calibration.b, calibration.c
    );
    Ok(calibration)
}
