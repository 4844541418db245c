//! Rank and correlation statistics over pairwise-complete observations.

use std::cmp::Ordering;

/// Ranks starting at 1, ties sharing the average of their positions
pub fn rank_average(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len()
            && values[order[end]].partial_cmp(&values[order[start]]) == Some(Ordering::Equal)
        {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = rank;
        }
        start = end;
    }
    ranks
}

/// Pearson correlation coefficient.
///
/// `None` when fewer than two observations remain or either variable is
/// constant. Identical inputs give exactly `1.0`.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    if x == y {
        return Some(1.0);
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Spearman rank correlation: Pearson over average ranks
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&rank_average(x), &rank_average(y))
}

/// Keep the positions where both cells are present
pub fn pairwise_complete(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_average_ties() {
        assert_eq!(rank_average(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
        assert_eq!(rank_average(&[]), Vec::<f64>::new());
    }

    #[test]
    fn test_pearson_known_values() {
        let r = pearson(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.5]).unwrap();
        assert!(r > 0.99 && r < 1.0);

        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_inputs_are_exactly_one() {
        let x = [0.3, 1.7, 0.2, 5.9, 2.2];
        assert_eq!(pearson(&x, &x), Some(1.0));
        assert_eq!(spearman(&x, &x), Some(1.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(spearman(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn test_spearman_is_rank_based() {
        // monotone but not linear
        let rho = spearman(&[1.0, 2.0, 3.0, 4.0], &[1.0, 8.0, 27.0, 64.0]).unwrap();
        assert!((rho - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pairwise_complete_drops_missing() {
        let (x, y) = pairwise_complete(
            &[Some(1.0), None, Some(3.0), Some(4.0)],
            &[Some(2.0), Some(5.0), None, Some(8.0)],
        );
        assert_eq!(x, vec![1.0, 4.0]);
        assert_eq!(y, vec![2.0, 8.0]);
    }
}
