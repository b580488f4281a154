//! Rank information coefficient.
//!
//! The rank IC of a period is the Spearman correlation between the composite
//! scores assigned on the rebalancing date and the returns those names went
//! on to realize over the holding period. It is diagnostic only.

use ronda_traits::stats::{mean, sample_std, spearman};
use serde::{Deserialize, Serialize};

use crate::metrics::nan_as_null;

/// Spearman rank correlation between scores and forward returns.
///
/// Pairs where either side is non-finite are dropped. Returns `NaN` when the
/// slices differ in length or fewer than two usable pairs remain.
///
/// # Arguments
///
/// * `scores` - Composite scores on the rebalancing date
/// * `forward_returns` - Realized holding-period returns of the same names
///
/// # Example
///
/// ```
/// use ronda_eval::rank_ic;
///
/// let scores = [0.9, 0.6, 0.3, 0.1];
/// let returns = [0.04, 0.02, 0.01, -0.03];
/// assert!((rank_ic(&scores, &returns) - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn rank_ic(scores: &[f64], forward_returns: &[f64]) -> f64 {
    if scores.len() != forward_returns.len() {
        return f64::NAN;
    }
    spearman(scores, forward_returns)
}

/// Summary of a rank IC time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IcSummary {
    /// Mean IC.
    #[serde(with = "nan_as_null")]
    pub mean: f64,
    /// Sample standard deviation of IC.
    #[serde(with = "nan_as_null")]
    pub std: f64,
    /// Mean over standard deviation, the IC information ratio.
    #[serde(with = "nan_as_null")]
    pub ir: f64,
    /// Fraction of periods with positive IC.
    #[serde(with = "nan_as_null")]
    pub hit_rate: f64,
    /// Number of finite observations.
    pub n_obs: usize,
}

impl IcSummary {
    /// Summarize a series, ignoring `NaN` periods.
    #[must_use]
    pub fn from_series(ics: &[f64]) -> Self {
        let valid: Vec<f64> = ics.iter().copied().filter(|x| x.is_finite()).collect();
        let n_obs = valid.len();
        let mean = mean(&valid);
        let std = sample_std(&valid);
        let ir = if std.is_finite() && std > 0.0 { mean / std } else { f64::NAN };
        let hit_rate =
            if n_obs == 0 { f64::NAN } else { valid.iter().filter(|x| **x > 0.0).count() as f64 / n_obs as f64 };
        Self { mean, std, ir, hit_rate, n_obs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_and_inverse_ic() {
        let scores = [0.1, 0.2, 0.3, 0.4, 0.5];
        let returns = [-0.02, -0.01, 0.0, 0.01, 0.02];
        assert_relative_eq!(rank_ic(&scores, &returns), 1.0, epsilon = 1e-12);
        let inverted = returns.map(|r| -r);
        assert_relative_eq!(rank_ic(&scores, &inverted), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ic_is_rank_based() {
        let scores = [1.0, 2.0, 3.0, 4.0];
        let returns = [0.001, 0.002, 0.5, 10.0];
        assert_relative_eq!(rank_ic(&scores, &returns), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ic_drops_non_finite_pairs() {
        let scores = [0.1, 0.2, f64::NAN, 0.4];
        let returns = [0.01, 0.02, 0.5, 0.03];
        assert_relative_eq!(rank_ic(&scores, &returns), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ic_degenerate() {
        assert!(rank_ic(&[0.1, 0.2], &[0.1]).is_nan());
        assert!(rank_ic(&[0.1], &[0.1]).is_nan());
    }

    #[test]
    fn test_summary() {
        let summary = IcSummary::from_series(&[0.1, 0.3, f64::NAN, -0.1]);
        assert_eq!(summary.n_obs, 3);
        assert_relative_eq!(summary.mean, 0.1, epsilon = 1e-12);
        assert_relative_eq!(summary.std, 0.2, epsilon = 1e-12);
        assert_relative_eq!(summary.ir, 0.5, epsilon = 1e-9);
        assert_relative_eq!(summary.hit_rate, 2.0 / 3.0, epsilon = 1e-12);

        let empty = IcSummary::from_series(&[]);
        assert_eq!(empty.n_obs, 0);
        assert!(empty.mean.is_nan() && empty.ir.is_nan());
    }
}
