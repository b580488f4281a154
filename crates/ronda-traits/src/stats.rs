//! Statistical utility functions shared by scoring, construction and evaluation.
//!
//! Ranking helpers sort with [`f64::total_cmp`] so that results never depend
//! on the order values arrive in.

use ndarray::Array1;

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Z-score standardization result containing computed statistics.
#[derive(Debug, Clone, Copy)]
pub struct StandardizeResult {
    /// The computed mean of the input values.
    pub mean: f64,
    /// The computed sample standard deviation (N-1 denominator).
    pub std: f64,
    /// Whether the standardization was applied (false if variance was too low).
    pub applied: bool,
}

/// Arithmetic mean, `NaN` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (N-1 denominator), `NaN` for fewer than two values.
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Standardize an ndarray Array1 to z-scores (mean=0, std=1).
///
/// Uses sample standard deviation (ddof=1). If the standard deviation is
/// below [`MIN_STD_THRESHOLD`] the result is all zeros.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::standardize_array;
/// use ndarray::Array1;
///
/// let scores = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
/// let (standardized, result) = standardize_array(&scores);
///
/// assert!(result.applied);
/// assert!((standardized[2]).abs() < 1e-12);
/// ```
pub fn standardize_array(scores: &Array1<f64>) -> (Array1<f64>, StandardizeResult) {
    if scores.is_empty() {
        return (
            Array1::zeros(0),
            StandardizeResult {
                mean: f64::NAN,
                std: f64::NAN,
                applied: false,
            },
        );
    }

    let mean = scores.mean().unwrap_or(0.0);
    let std = if scores.len() > 1 { scores.std(1.0) } else { 0.0 };

    let applied = std > MIN_STD_THRESHOLD;

    let standardized = if applied {
        (scores - mean) / std
    } else {
        Array1::zeros(scores.len())
    };

    (standardized, StandardizeResult { mean, std, applied })
}

/// 1-based ranks, ties receiving the average of the ranks they span.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::average_ranks;
///
/// assert_eq!(average_ranks(&[10.0, 30.0, 20.0, 20.0]), vec![1.0, 4.0, 2.5, 2.5]);
/// ```
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Sorted positions i..j share ranks i+1..=j
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    ranks
}

/// Percentile ranks `average_rank / n`, so the largest value maps to 1.0.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::percentile_ranks;
///
/// assert_eq!(percentile_ranks(&[3.0, 1.0, 2.0, 4.0]), vec![0.75, 0.25, 0.5, 1.0]);
/// ```
#[must_use]
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    average_ranks(values).into_iter().map(|r| r / n).collect()
}

/// Pearson correlation of two equally long slices, `NaN` when undefined.
#[must_use]
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let (mx, my) = (mean(x), mean(y));
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx <= 0.0 || vy <= 0.0 {
        return f64::NAN;
    }
    cov / (vx.sqrt() * vy.sqrt())
}

/// Spearman rank correlation over pairs where both values are finite.
///
/// Returns `NaN` with fewer than two valid pairs or when either side is
/// constant.
#[must_use]
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();
    if xs.len() < 2 {
        return f64::NAN;
    }
    pearson(&average_ranks(&xs), &average_ranks(&ys))
}

/// Herfindahl-Hirschman index, `Σ w²`.
#[must_use]
pub fn hhi(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}

/// Effective number of holdings, `1 / HHI`; `NaN` for no weight at all.
#[must_use]
pub fn effective_names(weights: &[f64]) -> f64 {
    let h = hhi(weights);
    if h > 0.0 { 1.0 / h } else { f64::NAN }
}
