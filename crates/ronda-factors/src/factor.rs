//! Factor definitions and raw-value extraction.
//!
//! A [`FactorDefinition`] names a factor, says where its raw value comes from
//! and whether lower values are better. Extraction works on one
//! [`InstrumentRecord`] at a time and never looks at other instruments, so it
//! can run in parallel; cross-sectional work happens in [`crate::normalize`].

use ronda_traits::stats::sample_std;
use ronda_traits::{InstrumentRecord, Result, RondaError};
use serde::{Deserialize, Serialize};

use crate::registry::{FactorKind, get_factor_info};

/// Where a factor's raw value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactorSource {
    /// A named fundamental metric on the record.
    Metric {
        /// Metric name as it appears in [`InstrumentRecord::metrics`].
        metric: String,
    },
    /// Trailing price return from `lookback` observations ago to `skip`
    /// observations ago.
    Momentum {
        /// Observations to look back.
        lookback: usize,
        /// Most recent observations to skip.
        skip: usize,
    },
    /// Sample standard deviation of the last `window` simple returns.
    Volatility {
        /// Number of returns in the window.
        window: usize,
    },
}

impl FactorSource {
    /// Price observations needed before the factor has a value; zero for
    /// fundamental metrics.
    #[must_use]
    pub const fn required_history(&self) -> usize {
        match self {
            Self::Metric { .. } => 0,
            Self::Momentum { lookback, .. } => *lookback + 1,
            Self::Volatility { window } => *window + 1,
        }
    }
}

/// Configuration of one scoring factor.
///
/// # Example
///
/// ```
/// use ronda_factors::FactorDefinition;
///
/// let roe = FactorDefinition::metric("roe");
/// let leverage = FactorDefinition::metric("debt_to_equity").as_risk();
/// let momentum = FactorDefinition::momentum("momentum_12_1", 252, 21).sector_neutral();
///
/// assert!(leverage.risk);
/// assert!(momentum.sector_neutral);
/// assert_eq!(roe.name, "roe");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorDefinition {
    /// Factor name, the key used by [`crate::FactorWeights`].
    pub name: String,
    /// Raw value source.
    pub source: FactorSource,
    /// Lower raw values are better; the factor contributes `1 - percentile`.
    #[serde(default)]
    pub risk: bool,
    /// Rank within sector buckets instead of universe-wide.
    #[serde(default)]
    pub sector_neutral: bool,
}

impl FactorDefinition {
    /// A factor reading the fundamental metric of the same name.
    #[must_use]
    pub fn metric(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: FactorSource::Metric { metric: name.clone() },
            name,
            risk: false,
            sector_neutral: false,
        }
    }

    /// A trailing price momentum factor.
    #[must_use]
    pub fn momentum(name: impl Into<String>, lookback: usize, skip: usize) -> Self {
        Self {
            name: name.into(),
            source: FactorSource::Momentum { lookback, skip },
            risk: false,
            sector_neutral: false,
        }
    }

    /// A trailing realized volatility factor, flagged as risk.
    #[must_use]
    pub fn volatility(name: impl Into<String>, window: usize) -> Self {
        Self {
            name: name.into(),
            source: FactorSource::Volatility { window },
            risk: true,
            sector_neutral: false,
        }
    }

    /// Build a definition from a built-in registry entry.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if no built-in factor has this name.
    pub fn from_registry(name: &str) -> Result<Self> {
        let info = get_factor_info(name)
            .ok_or_else(|| RondaError::Configuration(format!("unknown built-in factor '{name}'")))?;
        let source = match info.kind {
            FactorKind::Fundamental => FactorSource::Metric { metric: info.name.to_string() },
            FactorKind::Momentum { lookback, skip } => FactorSource::Momentum { lookback, skip },
            FactorKind::Volatility { window } => FactorSource::Volatility { window },
        };
        Ok(Self { name: info.name.to_string(), source, risk: info.is_risk, sector_neutral: false })
    }

    /// Mark the factor as a risk factor (lower is better).
    #[must_use]
    pub fn as_risk(mut self) -> Self {
        self.risk = true;
        self
    }

    /// Rank this factor within sector buckets.
    #[must_use]
    pub fn sector_neutral(mut self) -> Self {
        self.sector_neutral = true;
        self
    }

    /// Check the definition is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] for an empty name or metric, a
    /// momentum skip not shorter than its lookback, or a volatility window
    /// under two returns.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RondaError::Configuration("factor name must not be empty".into()));
        }
        match &self.source {
            FactorSource::Metric { metric } if metric.trim().is_empty() => {
                Err(RondaError::Configuration(format!("factor '{}' has an empty metric name", self.name)))
            }
            FactorSource::Momentum { lookback, skip } if skip >= lookback => {
                Err(RondaError::Configuration(format!(
                    "factor '{}': skip ({skip}) must be shorter than lookback ({lookback})",
                    self.name
                )))
            }
            FactorSource::Volatility { window } if *window < 2 => Err(RondaError::Configuration(
                format!("factor '{}': volatility window must be at least 2, got {window}", self.name),
            )),
            _ => Ok(()),
        }
    }

    /// Extract the raw value for one instrument, `None` when unavailable.
    ///
    /// Price-based sources read the record's trailing price history, which the
    /// snapshot has already truncated to the as-of date.
    #[must_use]
    pub fn raw_value(&self, record: &InstrumentRecord) -> Option<f64> {
        let value = match &self.source {
            FactorSource::Metric { metric } => record.metric(metric),
            FactorSource::Momentum { lookback, skip } => {
                let prices = record.price_history.as_ref()?.prices();
                momentum(&prices, *lookback, *skip)
            }
            FactorSource::Volatility { window } => {
                let prices = record.price_history.as_ref()?.prices();
                volatility(&prices, *window)
            }
        };
        value.filter(|v| v.is_finite())
    }
}

/// Return from the price `lookback` observations before the last to the price
/// `skip` observations before the last.
fn momentum(prices: &[f64], lookback: usize, skip: usize) -> Option<f64> {
    let n = prices.len();
    if skip >= lookback || n < lookback + 1 {
        return None;
    }
    let start = prices[n - 1 - lookback];
    let end = prices[n - 1 - skip];
    (start > 0.0).then(|| end / start - 1.0)
}

fn volatility(prices: &[f64], window: usize) -> Option<f64> {
    let n = prices.len();
    if window < 2 || n < window + 1 {
        return None;
    }
    let returns: Vec<f64> = prices[n - 1 - window..].windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let std = sample_std(&returns);
    std.is_finite().then_some(std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_traits::{Date, PriceSeries};
    use rstest::rstest;

    fn record_with_prices(prices: &[f64]) -> InstrumentRecord {
        let start = Date::from_ymd_opt(2024, 1, 1).unwrap();
        let series = PriceSeries::from_pairs(
            prices.iter().enumerate().map(|(i, p)| (start + chrono::Days::new(i as u64), *p)),
        );
        InstrumentRecord::new("AAPL", "Technology", start).with_price_history(series)
    }

    #[test]
    fn test_metric_source() {
        let record = InstrumentRecord::new("AAPL", "Technology", Date::from_ymd_opt(2024, 1, 1).unwrap())
            .with_metric("roe", Some(0.25))
            .with_metric("roic", Some(f64::NAN));
        assert_eq!(FactorDefinition::metric("roe").raw_value(&record), Some(0.25));
        assert_eq!(FactorDefinition::metric("roic").raw_value(&record), None);
        assert_eq!(FactorDefinition::metric("eps_growth").raw_value(&record), None);
    }

    #[test]
    fn test_momentum_skips_recent_observations() {
        // lookback 4, skip 1: from prices[0] to prices[3]
        let record = record_with_prices(&[100.0, 105.0, 110.0, 120.0, 90.0]);
        let factor = FactorDefinition::momentum("mom", 4, 1);
        assert_relative_eq!(factor.raw_value(&record).unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_momentum_needs_enough_history() {
        let record = record_with_prices(&[100.0, 105.0, 110.0]);
        assert_eq!(FactorDefinition::momentum("mom", 4, 1).raw_value(&record), None);
        let no_history =
            InstrumentRecord::new("AAPL", "Technology", Date::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(FactorDefinition::momentum("mom", 4, 1).raw_value(&no_history), None);
    }

    #[test]
    fn test_volatility_uses_trailing_window() {
        // The leading 1000.0 falls outside the 2-return window
        let record = record_with_prices(&[1000.0, 100.0, 110.0, 99.0]);
        let factor = FactorDefinition::volatility("vol", 2);
        let expected = sample_std(&[0.1, -0.1]);
        assert_relative_eq!(factor.raw_value(&record).unwrap(), expected, epsilon = 1e-12);
        assert!(factor.risk);
    }

    #[test]
    fn test_from_registry() {
        let factor = FactorDefinition::from_registry("debt_to_equity").unwrap();
        assert!(factor.risk);
        assert_eq!(factor.source, FactorSource::Metric { metric: "debt_to_equity".into() });
        assert_eq!(factor.source.required_history(), 0);

        let momentum = FactorDefinition::from_registry("momentum_12_1").unwrap();
        assert_eq!(momentum.source.required_history(), 253);

        assert!(matches!(
            FactorDefinition::from_registry("alpha_from_nowhere"),
            Err(RondaError::Configuration(_))
        ));
    }

    #[rstest]
    #[case(FactorDefinition::metric(""))]
    #[case(FactorDefinition::momentum("mom", 5, 5))]
    #[case(FactorDefinition::volatility("vol", 1))]
    fn test_validate_rejects(#[case] factor: FactorDefinition) {
        assert!(matches!(factor.validate(), Err(RondaError::Configuration(_))));
    }

    #[test]
    fn test_definition_deserializes() {
        let factor: FactorDefinition = serde_json::from_str(
            r#"{"name": "leverage", "source": {"type": "metric", "metric": "debt_to_equity"}, "risk": true}"#,
        )
        .unwrap();
        assert!(factor.risk);
        assert!(!factor.sector_neutral);
        assert!(factor.validate().is_ok());
    }
}
