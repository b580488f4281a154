//! Portfolio performance metrics.
//!
//! Pure functions over per-period return series. Nothing here keeps state,
//! so calling a metric twice on the same series gives the same value.
//! Degenerate inputs (empty series, zero dispersion, a wiped-out portfolio)
//! return `NaN`, which serializes as JSON `null`.

use ronda_traits::stats::{mean, sample_std};
use serde::{Deserialize, Serialize};

pub use ronda_traits::stats::{effective_names, hhi};

/// Serialize `NaN` as `null` and read `null` back as `NaN`.
pub mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Write a float, mapping `NaN` to `None`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() { serializer.serialize_none() } else { serializer.serialize_some(value) }
    }

    /// Read a float, mapping `None` to `NaN`.
    ///
    /// # Errors
    ///
    /// Propagates deserializer errors.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// Compounded growth `Π(1 + r)`, `NaN` for an empty series.
fn growth(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    returns.iter().map(|r| 1.0 + r).product()
}

/// Compounded total return `Π(1 + r) − 1`.
///
/// # Example
///
/// ```
/// use ronda_eval::metrics::cumulative_return;
///
/// assert!((cumulative_return(&[0.10, -0.10]) + 0.01).abs() < 1e-12);
/// ```
#[must_use]
pub fn cumulative_return(returns: &[f64]) -> f64 {
    growth(returns) - 1.0
}

/// Compound annual growth rate `(Π(1 + r))^(1/years) − 1` with
/// `years = n / periods_per_year`.
///
/// `NaN` for an empty series, a non-positive period count, or a series that
/// loses everything.
#[must_use]
pub fn cagr(returns: &[f64], periods_per_year: f64) -> f64 {
    let g = growth(returns);
    if periods_per_year.is_nan() || periods_per_year <= 0.0 || g.is_nan() || g <= 0.0 {
        return f64::NAN;
    }
    let years = returns.len() as f64 / periods_per_year;
    g.powf(1.0 / years) - 1.0
}

/// Per-period alpha, `portfolio − benchmark`, over the common length.
#[must_use]
pub fn alpha_series(portfolio: &[f64], benchmark: &[f64]) -> Vec<f64> {
    portfolio.iter().zip(benchmark).map(|(p, b)| p - b).collect()
}

/// Arithmetic sum of alphas, before any compounding.
#[must_use]
pub fn cumulative_alpha(alphas: &[f64]) -> f64 {
    if alphas.is_empty() { f64::NAN } else { alphas.iter().sum() }
}

/// Fraction of periods with strictly positive alpha.
///
/// # Example
///
/// ```
/// use ronda_eval::metrics::{alpha_series, hit_rate};
///
/// let alpha = alpha_series(&[0.05, -0.02], &[0.03, 0.00]);
/// assert_eq!(hit_rate(&alpha), 0.5);
/// ```
#[must_use]
pub fn hit_rate(alphas: &[f64]) -> f64 {
    if alphas.is_empty() {
        return f64::NAN;
    }
    alphas.iter().filter(|a| **a > 0.0).count() as f64 / alphas.len() as f64
}

/// Sample standard deviation scaled by `√periods_per_year`.
#[must_use]
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    sample_std(returns) * periods_per_year.sqrt()
}

/// Annualized standard deviation of alpha.
#[must_use]
pub fn tracking_error(portfolio: &[f64], benchmark: &[f64], periods_per_year: f64) -> f64 {
    annualized_volatility(&alpha_series(portfolio, benchmark), periods_per_year)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.is_finite() && denominator > 0.0 { numerator / denominator } else { f64::NAN }
}

/// `(annualized_return − risk_free) / annualized_volatility`.
#[must_use]
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64, risk_free: f64) -> f64 {
    ratio(cagr(returns, periods_per_year) - risk_free, annualized_volatility(returns, periods_per_year))
}

/// Annualized alpha, `CAGR(portfolio) − CAGR(benchmark)`.
#[must_use]
pub fn annualized_alpha(portfolio: &[f64], benchmark: &[f64], periods_per_year: f64) -> f64 {
    let n = portfolio.len().min(benchmark.len());
    cagr(&portfolio[..n], periods_per_year) - cagr(&benchmark[..n], periods_per_year)
}

/// `annualized_alpha / tracking_error`.
#[must_use]
pub fn information_ratio(portfolio: &[f64], benchmark: &[f64], periods_per_year: f64) -> f64 {
    ratio(
        annualized_alpha(portfolio, benchmark, periods_per_year),
        tracking_error(portfolio, benchmark, periods_per_year),
    )
}

/// Largest peak-to-trough loss, `min(cum / peak − 1)`, as a value in
/// `[-1, 0]`. The curve starts at 1.0, so a first-period loss counts.
///
/// # Example
///
/// ```
/// use ronda_eval::metrics::max_drawdown;
///
/// // 1.0 → 1.1 → 0.88 → 0.968
/// assert!((max_drawdown(&[0.10, -0.20, 0.10]) + 0.20).abs() < 1e-12);
/// ```
#[must_use]
pub fn max_drawdown(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return f64::NAN;
    }
    let mut cum = 1.0;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for r in returns {
        cum *= 1.0 + r;
        peak = peak.max(cum);
        worst = worst.min(cum / peak - 1.0);
    }
    worst
}

/// Annualized root-mean-square of returns below `target`.
#[must_use]
pub fn downside_deviation(returns: &[f64], periods_per_year: f64, target: f64) -> f64 {
    if returns.len() < 2 {
        return f64::NAN;
    }
    let shortfall: f64 = returns.iter().map(|r| (r - target).min(0.0).powi(2)).sum();
    (shortfall / returns.len() as f64).sqrt() * periods_per_year.sqrt()
}

/// `(annualized_return − risk_free) / downside_deviation`, with the
/// risk-free rate converted to a per-period target.
#[must_use]
pub fn sortino_ratio(returns: &[f64], periods_per_year: f64, risk_free: f64) -> f64 {
    let target = risk_free / periods_per_year;
    ratio(cagr(returns, periods_per_year) - risk_free, downside_deviation(returns, periods_per_year, target))
}

/// `annualized_return / |max_drawdown|`.
#[must_use]
pub fn calmar_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    ratio(cagr(returns, periods_per_year), max_drawdown(returns).abs())
}

/// The full metric set for one portfolio/benchmark return pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Number of periods aggregated.
    pub periods: usize,
    /// Compounded portfolio return.
    #[serde(with = "nan_as_null")]
    pub cumulative_return: f64,
    /// Portfolio CAGR.
    #[serde(with = "nan_as_null")]
    pub annualized_return: f64,
    /// Compounded benchmark return.
    #[serde(with = "nan_as_null")]
    pub benchmark_cumulative_return: f64,
    /// Benchmark CAGR.
    #[serde(with = "nan_as_null")]
    pub benchmark_annualized_return: f64,
    /// Arithmetic sum of per-period alpha.
    #[serde(with = "nan_as_null")]
    pub cumulative_alpha: f64,
    /// Portfolio CAGR minus benchmark CAGR.
    #[serde(with = "nan_as_null")]
    pub annualized_alpha: f64,
    /// Fraction of periods beating the benchmark.
    #[serde(with = "nan_as_null")]
    pub hit_rate: f64,
    /// Annualized portfolio volatility.
    #[serde(with = "nan_as_null")]
    pub volatility: f64,
    /// Annualized standard deviation of alpha.
    #[serde(with = "nan_as_null")]
    pub tracking_error: f64,
    /// Sharpe ratio.
    #[serde(with = "nan_as_null")]
    pub sharpe_ratio: f64,
    /// Sortino ratio.
    #[serde(with = "nan_as_null")]
    pub sortino_ratio: f64,
    /// Maximum drawdown, non-positive.
    #[serde(with = "nan_as_null")]
    pub max_drawdown: f64,
    /// Calmar ratio.
    #[serde(with = "nan_as_null")]
    pub calmar_ratio: f64,
    /// Information ratio.
    #[serde(with = "nan_as_null")]
    pub information_ratio: f64,
    /// Best single-period portfolio return.
    #[serde(with = "nan_as_null")]
    pub best_period: f64,
    /// Worst single-period portfolio return.
    #[serde(with = "nan_as_null")]
    pub worst_period: f64,
}

impl PerformanceMetrics {
    /// Compute every metric from aligned portfolio and benchmark returns.
    ///
    /// Series of different lengths are degenerate: every metric is `NaN`.
    ///
    /// # Example
    ///
    /// ```
    /// use ronda_eval::PerformanceMetrics;
    ///
    /// let m = PerformanceMetrics::compute(&[0.05, -0.02], &[0.03, 0.00], 4.0, 0.0);
    /// assert_eq!(m.hit_rate, 0.5);
    /// assert!(m.cumulative_alpha.abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn compute(portfolio: &[f64], benchmark: &[f64], periods_per_year: f64, risk_free: f64) -> Self {
        if portfolio.len() != benchmark.len() {
            return Self::degenerate(portfolio.len().min(benchmark.len()));
        }
        let alphas = alpha_series(portfolio, benchmark);
        let extreme = |pick: fn(f64, f64) -> f64| {
            portfolio.iter().copied().reduce(pick).unwrap_or(f64::NAN)
        };
        Self {
            periods: portfolio.len(),
            cumulative_return: cumulative_return(portfolio),
            annualized_return: cagr(portfolio, periods_per_year),
            benchmark_cumulative_return: cumulative_return(benchmark),
            benchmark_annualized_return: cagr(benchmark, periods_per_year),
            cumulative_alpha: cumulative_alpha(&alphas),
            annualized_alpha: annualized_alpha(portfolio, benchmark, periods_per_year),
            hit_rate: hit_rate(&alphas),
            volatility: annualized_volatility(portfolio, periods_per_year),
            tracking_error: annualized_volatility(&alphas, periods_per_year),
            sharpe_ratio: sharpe_ratio(portfolio, periods_per_year, risk_free),
            sortino_ratio: sortino_ratio(portfolio, periods_per_year, risk_free),
            max_drawdown: max_drawdown(portfolio),
            calmar_ratio: calmar_ratio(portfolio, periods_per_year),
            information_ratio: information_ratio(portfolio, benchmark, periods_per_year),
            best_period: extreme(f64::max),
            worst_period: extreme(f64::min),
        }
    }

    /// Metrics for a series with nothing to aggregate.
    #[must_use]
    pub const fn degenerate(periods: usize) -> Self {
        Self {
            periods,
            cumulative_return: f64::NAN,
            annualized_return: f64::NAN,
            benchmark_cumulative_return: f64::NAN,
            benchmark_annualized_return: f64::NAN,
            cumulative_alpha: f64::NAN,
            annualized_alpha: f64::NAN,
            hit_rate: f64::NAN,
            volatility: f64::NAN,
            tracking_error: f64::NAN,
            sharpe_ratio: f64::NAN,
            sortino_ratio: f64::NAN,
            max_drawdown: f64::NAN,
            calmar_ratio: f64::NAN,
            information_ratio: f64::NAN,
            best_period: f64::NAN,
            worst_period: f64::NAN,
        }
    }
}

/// Mean of the finite values, `NaN` when there are none.
pub(crate) fn finite_mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    mean(&finite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_alpha_scenario() {
        let portfolio = [0.05, -0.02];
        let benchmark = [0.03, 0.00];
        let alpha = alpha_series(&portfolio, &benchmark);
        assert_relative_eq!(alpha[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(alpha[1], -0.02, epsilon = 1e-12);
        assert_eq!(hit_rate(&alpha), 0.5);
        assert_relative_eq!(cumulative_alpha(&alpha), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cagr() {
        // Four quarters of 2.5% is one year
        let returns = [0.025; 4];
        assert_relative_eq!(cagr(&returns, 4.0), 1.025_f64.powi(4) - 1.0, epsilon = 1e-12);
        // Eight quarters: two years
        let returns = [0.025; 8];
        assert_relative_eq!(cagr(&returns, 4.0), 1.025_f64.powi(4) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_volatility_and_tracking_error() {
        let returns = [0.01, 0.03, -0.01, 0.05];
        let expected = sample_std(&returns) * 2.0;
        assert_relative_eq!(annualized_volatility(&returns, 4.0), expected, epsilon = 1e-12);
        assert_relative_eq!(tracking_error(&returns, &[0.0; 4], 4.0), expected, epsilon = 1e-12);
        assert_relative_eq!(tracking_error(&returns, &returns, 4.0), 0.0);
    }

    #[test]
    fn test_sharpe_and_information_ratio() {
        let portfolio = [0.04, 0.01, 0.03, -0.01];
        let benchmark = [0.02, 0.01, 0.01, 0.00];
        let sharpe = sharpe_ratio(&portfolio, 4.0, 0.02);
        let expected = (cagr(&portfolio, 4.0) - 0.02) / annualized_volatility(&portfolio, 4.0);
        assert_relative_eq!(sharpe, expected, epsilon = 1e-12);

        let ir = information_ratio(&portfolio, &benchmark, 4.0);
        let expected = (cagr(&portfolio, 4.0) - cagr(&benchmark, 4.0)) / tracking_error(&portfolio, &benchmark, 4.0);
        assert_relative_eq!(ir, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown() {
        assert_eq!(max_drawdown(&[0.01, 0.02, 0.03]), 0.0);
        assert_relative_eq!(max_drawdown(&[-0.5]), -0.5, epsilon = 1e-12);
        // 1.5 → 0.75 → 0.9 → 0.72
        assert_relative_eq!(max_drawdown(&[0.5, -0.5, 0.2, -0.2]), -0.52, epsilon = 1e-12);
    }

    #[rstest]
    #[case(cagr(&[], 4.0))]
    #[case(cagr(&[-1.0], 4.0))]
    #[case(cumulative_return(&[]))]
    #[case(hit_rate(&[]))]
    #[case(annualized_volatility(&[0.1], 4.0))]
    #[case(sharpe_ratio(&[0.25; 4], 4.0, 0.0))]
    #[case(information_ratio(&[0.5, 0.25], &[0.25, 0.0], 4.0))]
    #[case(max_drawdown(&[]))]
    #[case(calmar_ratio(&[0.01, 0.02], 4.0))]
    #[case(effective_names(&[]))]
    fn test_degenerate_inputs_are_nan(#[case] value: f64) {
        assert!(value.is_nan());
    }

    #[test]
    fn test_hhi_and_effective_names() {
        assert_relative_eq!(hhi(&[0.5, 0.3, 0.2]), 0.38, epsilon = 1e-12);
        assert_relative_eq!(effective_names(&[0.25; 4]), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sortino_ignores_upside() {
        let returns = [0.05, -0.02, 0.04, -0.01];
        let downside = downside_deviation(&returns, 4.0, 0.0);
        assert_relative_eq!(downside, ((0.0004 + 0.0001) / 4.0_f64).sqrt() * 2.0, epsilon = 1e-12);
        assert!(sortino_ratio(&returns, 4.0, 0.0) > sharpe_ratio(&returns, 4.0, 0.0));
    }

    #[test]
    fn test_performance_metrics_idempotent() {
        let portfolio = [0.05, -0.02, 0.03, 0.01];
        let benchmark = [0.03, 0.00, 0.02, 0.02];
        let a = PerformanceMetrics::compute(&portfolio, &benchmark, 4.0, 0.01);
        let b = PerformanceMetrics::compute(&portfolio, &benchmark, 4.0, 0.01);
        assert_eq!(a, b);
        assert_eq!(a.periods, 4);
        assert_relative_eq!(a.best_period, 0.05);
        assert_relative_eq!(a.worst_period, -0.02);
    }

    #[test]
    fn test_mismatched_lengths_are_degenerate() {
        let m = PerformanceMetrics::compute(&[0.01, 0.02], &[0.01], 4.0, 0.0);
        assert!(m.cumulative_return.is_nan());
        assert!(m.sharpe_ratio.is_nan());
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let m = PerformanceMetrics::degenerate(0);
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"sharpe_ratio\":null"));
        let back: PerformanceMetrics = serde_json::from_str(&json).unwrap();
        assert!(back.sharpe_ratio.is_nan());
    }
}
