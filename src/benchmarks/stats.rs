// Benchmark Statistics - Ranks, correlations and normalisation over small vectors
// Degenerate inputs (empty, constant, mismatched lengths) yield NaN rather than an error

use std::cmp::Ordering;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// `(v - mean) / sample_std` for every value
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let sd = sample_std(values);
    values.iter().map(|v| (v - m) / sd).collect()
}

fn ascending(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Indices that sort `values` ascending, equal values keeping input order
fn argsort(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| ascending(&values[a], &values[b]));
    indices
}

/// 1-based ranks, ties sharing the average of the positions they span
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let order = argsort(values);
    let mut ranks = vec![0.0; values.len()];

    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let shared = (start + end) as f64 / 2.0 + 1.0;
        for &index in &order[start..=end] {
            ranks[index] = shared;
        }
        start = end + 1;
    }
    ranks
}

/// Average ranks divided by the number of values, in `(0, 1]`
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    average_ranks(values).into_iter().map(|rank| rank / n).collect()
}

/// 1-based ranks with ties broken by input order
pub fn ordinal_ranks(values: &[f64]) -> Vec<usize> {
    let mut ranks = vec![0; values.len()];
    for (position, index) in argsort(values).into_iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

/// Pearson correlation coefficient
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let (mx, my) = (mean(x), mean(y));
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        var_x += (a - mx).powi(2);
        var_y += (b - my).powi(2);
    }
    cov / (var_x * var_y).sqrt()
}

/// Spearman rank correlation: Pearson over average ranks
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Index of the element closest to `target`; the first one wins ties
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, value)| {
            let distance = (value - target).abs();
            match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some((index, distance)),
            }
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_std() {
        assert!(close(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5));
        assert!(close(sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.138089935299395));
        assert!(mean(&[]).is_nan());
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn test_z_scores() {
        let z = z_scores(&[1.0, 2.0, 3.0]);
        assert!(close(z[0], -1.0));
        assert!(close(z[1], 0.0));
        assert!(close(z[2], 1.0));
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
        assert_eq!(average_ranks(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_percentile_ranks() {
        let negated: Vec<f64> = [2.0, 1.0, 3.0].iter().map(|v: &f64| -v).collect();
        let percentiles = percentile_ranks(&negated);
        assert!(close(percentiles[1], 1.0));
        assert!(close(percentiles[2], 1.0 / 3.0));
    }

    #[test]
    fn test_ordinal_ranks_break_ties_by_position() {
        assert_eq!(ordinal_ranks(&[5.0, 1.0, 5.0, 0.0]), vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_correlations() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!(close(pearson(&x, &y), 1.0));

        let reversed = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!(close(pearson(&x, &reversed), -1.0));

        let monotone = [1.0, 4.0, 9.0, 16.0, 100.0];
        assert!(close(spearman(&x, &monotone), 1.0));

        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0, 1.0]).is_nan());
        assert!(pearson(&x, &y[..3]).is_nan());
    }

    #[test]
    fn test_nearest_index() {
        let times = [0.0, 0.5, 1.0, 1.5];
        assert_eq!(nearest_index(&times, 0.7), Some(1));
        assert_eq!(nearest_index(&times, 0.75), Some(1));
        assert_eq!(nearest_index(&times, 9.0), Some(3));
        assert_eq!(nearest_index(&[], 1.0), None);
    }
}
