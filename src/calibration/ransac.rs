use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::polyfit::{fit_quadratic, r2_score};
use super::{Calibration, CalibrationError};

/// Parameters of the RANSAC estimator
#[derive(Debug, Clone, PartialEq)]
pub struct RansacOptions {
    /// Points drawn per trial
    pub min_samples: usize,
    /// Maximum absolute residual of an inlier.
    /// `None` uses the median absolute deviation of the targets.
    pub residual_threshold: Option<f64>,
    /// Upper bound on the number of trials
    pub max_trials: usize,
    /// Confidence at which trials stop early
    pub stop_probability: f64,
    /// Seed of the sampling RNG
    pub seed: u64,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            min_samples: 3,
            residual_threshold: None,
            max_trials: 100,
            stop_probability: 0.99,
            seed: 0,
        }
    }
}

/// Robust fit with the consensus set that produced it
#[derive(Debug, Clone)]
pub(crate) struct RansacFit {
    pub model: Calibration,
    pub inliers: Vec<bool>,
    pub trials: usize,
}

impl RansacFit {
    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&i| i).count()
    }
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn median_absolute_deviation(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    let center = median(&mut sorted);
    let mut deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&mut deviations)
}

/// Trials needed to draw an all-inlier sample with the given confidence
fn dynamic_max_trials(inliers: usize, samples: usize, min_samples: usize, probability: f64) -> usize {
    let ratio = inliers as f64 / samples as f64;
    let nom = (1.0 - probability).max(f64::EPSILON);
    let denom = (1.0 - ratio.powi(min_samples as i32)).max(f64::EPSILON);
    if nom == 1.0 {
        return 0;
    }
    if denom == 1.0 {
        return usize::MAX;
    }
    (nom.ln() / denom.ln()).ceil().abs() as usize
}

/// Quadratic RANSAC: repeatedly fit random minimal subsets, keep the model
/// with the largest consensus set (ties broken by R² on that set), then refit
/// on the consensus set.
pub(crate) fn ransac_quadratic(
    x: &[f64],
    y: &[f64],
    options: &RansacOptions,
) -> Result<RansacFit, CalibrationError> {
    let n = x.len();
    if options.min_samples < 3 || options.min_samples > n {
        return Err(CalibrationError::InvalidOptions(format!(
            "min_samples must be between 3 and the number of points ({}), got {}",
            n, options.min_samples
        )));
    }
    if !(0.0..=1.0).contains(&options.stop_probability) {
        return Err(CalibrationError::InvalidOptions(format!(
            "stop_probability must be in [0, 1], got {}",
            options.stop_probability
        )));
    }

    // floor relative to the target scale
    let scale = y.iter().fold(1.0_f64, |m, v| m.max(v.abs()));
    let threshold = options
        .residual_threshold
        .unwrap_or_else(|| median_absolute_deviation(y))
        .max(1e-9 * scale);

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut best: Option<(usize, f64, Vec<bool>)> = None;
    let mut max_trials = options.max_trials;
    let mut trials = 0;

    while trials < max_trials {
        trials += 1;

        let subset = rand::seq::index::sample(&mut rng, n, options.min_samples).into_vec();
        let sx: Vec<f64> = subset.iter().map(|&i| x[i]).collect();
        let sy: Vec<f64> = subset.iter().map(|&i| y[i]).collect();
        let model = match fit_quadratic(&sx, &sy) {
            Ok(model) => model,
            Err(e) => {
                trace!("Skipping degenerate subset {:?}: {}", subset, e);
                continue;
            }
        };

        let inliers: Vec<bool> = x
            .iter()
            .zip(y)
            .map(|(&xi, &yi)| (yi - model.adjust(xi)).abs() <= threshold)
            .collect();
        let count = inliers.iter().filter(|&&i| i).count();
        if count == 0 {
            continue;
        }

        let (ix, iy): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .zip(&inliers)
            .filter(|(_, keep)| **keep)
            .map(|((&xi, &yi), _)| (xi, yi))
            .unzip();
        let predicted: Vec<f64> = ix.iter().map(|&xi| model.adjust(xi)).collect();
        let score = r2_score(&iy, &predicted);

        let better = match &best {
            None => true,
            Some((best_count, best_score, _)) => {
                count > *best_count || (count == *best_count && score > *best_score)
            }
        };
        if !better {
            continue;
        }

        best = Some((count, score, inliers));
        max_trials = max_trials.min(dynamic_max_trials(
            count,
            n,
            options.min_samples,
            options.stop_probability,
        ));
    }

    let Some((count, score, inliers)) = best else {
        return Err(CalibrationError::NoConsensus { trials });
    };
    debug!(
        "RANSAC consensus: {}/{} inliers after {} trials (R² {:.6})",
        count, n, trials, score
    );

    let (ix, iy): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .zip(&inliers)
        .filter(|(_, keep)| **keep)
        .map(|((&xi, &yi), _)| (xi, yi))
        .unzip();
    let model = fit_quadratic(&ix, &iy)?;

    Ok(RansacFit {
        model,
        inliers,
        trials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mad() {
        assert_eq!(median_absolute_deviation(&[1.0, 2.0, 3.0, 4.0, 100.0]), 1.0);
    }

    #[test]
    fn test_dynamic_trials_stop_when_all_inliers() {
        assert_eq!(dynamic_max_trials(10, 10, 3, 0.99), 1);
        assert!(dynamic_max_trials(5, 10, 3, 0.99) > 1);
    }

    #[test]
    fn test_rejects_single_outlier() {
        let x: Vec<f64> = vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0];
        let mut y: Vec<f64> = x.iter().map(|v| 1e-6 * v * v + 1.001 * v + 0.02).collect();
        y[3] += 5.0;

        let options = RansacOptions {
            residual_threshold: Some(0.01),
            ..Default::default()
        };
        let fit = ransac_quadratic(&x, &y, &options).unwrap();
        assert_eq!(fit.inlier_count(), 6);
        assert!(!fit.inliers[3]);
        assert!((fit.model.adjust(400.0) - (1e-6 * 160_000.0 + 400.4 + 0.02)).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_min_samples() {
        let x = [1.0, 2.0, 3.0];
        let options = RansacOptions {
            min_samples: 4,
            ..Default::default()
        };
        assert!(matches!(
            ransac_quadratic(&x, &x, &options),
            Err(CalibrationError::InvalidOptions(_))
        ));
    }
}
