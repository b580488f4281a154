//! Hard eligibility filters.
//!
//! Filters are absolute pass/fail thresholds applied to each instrument
//! before any ranking, so an excluded instrument never moves another
//! instrument's percentile.

use ronda_traits::{InstrumentRecord, Result, RondaError};
use serde::{Deserialize, Serialize};

/// One absolute eligibility threshold.
///
/// Filters on optional data decide through `exclude_missing` whether a
/// missing value fails the filter; by default it passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HardFilter {
    /// Exclude when a metric exceeds `max` (e.g. leverage cap).
    MaxMetric {
        /// Metric name.
        metric: String,
        /// Inclusive upper bound.
        max: f64,
        /// Whether a missing metric fails the filter.
        #[serde(default)]
        exclude_missing: bool,
    },
    /// Exclude when a metric is below `min` (e.g. interest coverage floor).
    MinMetric {
        /// Metric name.
        metric: String,
        /// Inclusive lower bound.
        min: f64,
        /// Whether a missing metric fails the filter.
        #[serde(default)]
        exclude_missing: bool,
    },
    /// Exclude instruments with fewer trailing price observations.
    MinPriceHistory {
        /// Minimum number of observations.
        observations: usize,
    },
    /// Exclude instruments below a market capitalization.
    MinMarketCap {
        /// Inclusive lower bound.
        min: f64,
        /// Whether a missing market cap fails the filter.
        #[serde(default)]
        exclude_missing: bool,
    },
    /// Exclude instruments below an average daily dollar volume.
    MinDollarVolume {
        /// Inclusive lower bound.
        min: f64,
        /// Whether a missing volume fails the filter.
        #[serde(default)]
        exclude_missing: bool,
    },
    /// Exclude instruments with data for fewer configured factors.
    MinFactorCoverage {
        /// Minimum number of factors with a raw value.
        min_factors: usize,
    },
}

fn check_max(label: &str, value: Option<f64>, max: f64, exclude_missing: bool) -> Option<String> {
    match value {
        Some(v) if v > max => Some(format!("{label} {v} above maximum {max}")),
        None if exclude_missing => Some(format!("{label} missing")),
        _ => None,
    }
}

fn check_min(label: &str, value: Option<f64>, min: f64, exclude_missing: bool) -> Option<String> {
    match value {
        Some(v) if v < min => Some(format!("{label} {v} below minimum {min}")),
        None if exclude_missing => Some(format!("{label} missing")),
        _ => None,
    }
}

impl HardFilter {
    /// Short name used in logs and exclusion reasons.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MaxMetric { .. } => "max_metric",
            Self::MinMetric { .. } => "min_metric",
            Self::MinPriceHistory { .. } => "min_price_history",
            Self::MinMarketCap { .. } => "min_market_cap",
            Self::MinDollarVolume { .. } => "min_dollar_volume",
            Self::MinFactorCoverage { .. } => "min_factor_coverage",
        }
    }

    /// Returns the reason the record fails this filter, or `None` if it
    /// passes. `coverage` is the number of configured factors with data.
    #[must_use]
    pub fn violation(&self, record: &InstrumentRecord, coverage: usize) -> Option<String> {
        match self {
            Self::MaxMetric { metric, max, exclude_missing } => {
                check_max(metric, record.metric(metric), *max, *exclude_missing)
            }
            Self::MinMetric { metric, min, exclude_missing } => {
                check_min(metric, record.metric(metric), *min, *exclude_missing)
            }
            Self::MinPriceHistory { observations } => {
                let len = record.price_history_len();
                (len < *observations)
                    .then(|| format!("price history {len} observations, {observations} required"))
            }
            Self::MinMarketCap { min, exclude_missing } => check_min(
                "market_cap",
                record.market_cap.filter(|v| v.is_finite()),
                *min,
                *exclude_missing,
            ),
            Self::MinDollarVolume { min, exclude_missing } => check_min(
                "avg_dollar_volume",
                record.avg_dollar_volume.filter(|v| v.is_finite()),
                *min,
                *exclude_missing,
            ),
            Self::MinFactorCoverage { min_factors } => (coverage < *min_factors)
                .then(|| format!("data for {coverage} factors, {min_factors} required")),
        }
    }

    /// Check thresholds are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] for non-finite thresholds or an
    /// empty metric name.
    pub fn validate(&self) -> Result<()> {
        let (metric, bound) = match self {
            Self::MaxMetric { metric, max, .. } => (Some(metric), Some(*max)),
            Self::MinMetric { metric, min, .. } => (Some(metric), Some(*min)),
            Self::MinMarketCap { min, .. } | Self::MinDollarVolume { min, .. } => (None, Some(*min)),
            Self::MinPriceHistory { .. } | Self::MinFactorCoverage { .. } => (None, None),
        };
        if metric.is_some_and(|m| m.trim().is_empty()) {
            return Err(RondaError::Configuration(format!("{} filter has an empty metric name", self.kind())));
        }
        if bound.is_some_and(|b| !b.is_finite()) {
            return Err(RondaError::Configuration(format!("{} filter threshold must be finite", self.kind())));
        }
        Ok(())
    }
}

/// An ordered set of hard filters; an instrument must pass all of them.
///
/// # Example
///
/// ```
/// use ronda_factors::HardFilterSet;
///
/// let filters = HardFilterSet::new()
///     .max_metric("debt_to_equity", 2.0)
///     .min_metric("interest_coverage", 3.0)
///     .min_price_history(253);
/// assert_eq!(filters.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardFilterSet {
    filters: Vec<HardFilter>,
}

impl HardFilterSet {
    /// An empty filter set that admits every instrument.
    #[must_use]
    pub const fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Add an arbitrary filter.
    #[must_use]
    pub fn with(mut self, filter: HardFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Exclude instruments whose `metric` exceeds `max`.
    #[must_use]
    pub fn max_metric(self, metric: impl Into<String>, max: f64) -> Self {
        self.with(HardFilter::MaxMetric { metric: metric.into(), max, exclude_missing: false })
    }

    /// Exclude instruments whose `metric` is below `min`.
    #[must_use]
    pub fn min_metric(self, metric: impl Into<String>, min: f64) -> Self {
        self.with(HardFilter::MinMetric { metric: metric.into(), min, exclude_missing: false })
    }

    /// Exclude instruments with fewer than `observations` prices.
    #[must_use]
    pub fn min_price_history(self, observations: usize) -> Self {
        self.with(HardFilter::MinPriceHistory { observations })
    }

    /// The filters in evaluation order.
    #[must_use]
    pub fn filters(&self) -> &[HardFilter] {
        &self.filters
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the set admits everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The first failed filter's reason, prefixed with its kind.
    #[must_use]
    pub fn first_violation(&self, record: &InstrumentRecord, coverage: usize) -> Option<String> {
        self.filters
            .iter()
            .find_map(|f| f.violation(record, coverage).map(|reason| format!("{}: {reason}", f.kind())))
    }

    /// Validate every filter.
    ///
    /// # Errors
    ///
    /// Returns the first filter's configuration error.
    pub fn validate(&self) -> Result<()> {
        self.filters.iter().try_for_each(HardFilter::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda_traits::Date;
    use rstest::rstest;

    fn record() -> InstrumentRecord {
        InstrumentRecord::new("XOM", "Energy", Date::from_ymd_opt(2024, 1, 2).unwrap())
            .with_metric("debt_to_equity", Some(2.5))
            .with_metric("interest_coverage", None)
            .with_market_cap(4.0e11)
    }

    #[rstest]
    #[case(HardFilter::MaxMetric { metric: "debt_to_equity".into(), max: 2.0, exclude_missing: false }, true)]
    #[case(HardFilter::MaxMetric { metric: "debt_to_equity".into(), max: 2.5, exclude_missing: false }, false)]
    #[case(HardFilter::MinMetric { metric: "interest_coverage".into(), min: 3.0, exclude_missing: false }, false)]
    #[case(HardFilter::MinMetric { metric: "interest_coverage".into(), min: 3.0, exclude_missing: true }, true)]
    #[case(HardFilter::MinMarketCap { min: 1.0e9, exclude_missing: false }, false)]
    #[case(HardFilter::MinDollarVolume { min: 1.0e6, exclude_missing: false }, false)]
    #[case(HardFilter::MinDollarVolume { min: 1.0e6, exclude_missing: true }, true)]
    #[case(HardFilter::MinPriceHistory { observations: 1 }, true)]
    #[case(HardFilter::MinFactorCoverage { min_factors: 3 }, true)]
    #[case(HardFilter::MinFactorCoverage { min_factors: 2 }, false)]
    fn test_violation(#[case] filter: HardFilter, #[case] fails: bool) {
        assert_eq!(filter.violation(&record(), 2).is_some(), fails);
    }

    #[test]
    fn test_first_violation_names_filter() {
        let filters = HardFilterSet::new().min_price_history(0).max_metric("debt_to_equity", 2.0);
        let reason = filters.first_violation(&record(), 0).unwrap();
        assert!(reason.starts_with("max_metric"));
        assert!(reason.contains("2.5"));
        assert!(HardFilterSet::new().first_violation(&record(), 0).is_none());
    }

    #[test]
    fn test_validate() {
        assert!(HardFilterSet::new().max_metric("debt_to_equity", 2.0).validate().is_ok());
        assert!(HardFilterSet::new().max_metric("", 2.0).validate().is_err());
        assert!(HardFilterSet::new().min_metric("roe", f64::NAN).validate().is_err());
    }

    #[test]
    fn test_deserialize() {
        let filters: HardFilterSet = serde_json::from_str(
            r#"[
                {"type": "max_metric", "metric": "debt_to_equity", "max": 2.0},
                {"type": "min_price_history", "observations": 253}
            ]"#,
        )
        .unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters.filters()[0],
            HardFilter::MaxMetric { metric: "debt_to_equity".into(), max: 2.0, exclude_missing: false }
        );
    }
}
