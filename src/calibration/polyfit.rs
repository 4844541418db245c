use nalgebra::{DMatrix, DVector};

use super::{Calibration, CalibrationError};

/// Unweighted least-squares fit of `y = a·x² + b·x + c`.
///
/// The abscissa is centered and scaled to `[-1, 1]` before solving and the
/// coefficients are expanded back to the raw axis afterwards.
pub(crate) fn fit_quadratic(x: &[f64], y: &[f64]) -> Result<Calibration, CalibrationError> {
    if x.len() != y.len() {
        return Err(CalibrationError::LengthMismatch {
            reference: x.len(),
            observed: y.len(),
        });
    }
    if x.len() < 3 {
        return Err(CalibrationError::TooFewPoints { distinct: x.len() });
    }

    let n = x.len() as f64;
    let center = x.iter().sum::<f64>() / n;
    let scale = x.iter().map(|v| (v - center).abs()).fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return Err(CalibrationError::Degenerate(
            "all abscissae are identical".to_string(),
        ));
    }

    let design = DMatrix::from_fn(x.len(), 3, |row, col| {
        let t = (x[row] - center) / scale;
        t.powi(col as i32)
    });
    let rhs = DVector::from_column_slice(y);

    let svd = design.svd(true, true);
    let eps = 1e-12 * svd.singular_values.max();
    if svd.rank(eps) < 3 {
        return Err(CalibrationError::Degenerate(
            "fewer than 3 distinct abscissae".to_string(),
        ));
    }
    let p = svd
        .solve(&rhs, eps)
        .map_err(|e| CalibrationError::Degenerate(e.to_string()))?;

    let (p0, p1, p2) = (p[0], p[1], p[2]);
    let s2 = scale * scale;
    Ok(Calibration {
        a: p2 / s2,
        b: p1 / scale - 2.0 * p2 * center / s2,
        c: p0 - p1 * center / scale + p2 * center * center / s2,
    })
}

/// Coefficient of determination, following the convention that a constant
/// target scores 1.0 for a perfect prediction and 0.0 otherwise.
pub(crate) fn r2_score(y: &[f64], predicted: &[f64]) -> f64 {
    let n = y.len() as f64;
    if y.is_empty() {
        return 0.0;
    }
    let mean = y.iter().sum::<f64>() / n;
    let ss_res: f64 = y
        .iter()
        .zip(predicted)
        .map(|(a, b)| (a - b).powi(2))
        .sum();
    let ss_tot: f64 = y.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// `n` evenly spaced values over `[start, stop]`, both ends included
pub(crate) fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}
