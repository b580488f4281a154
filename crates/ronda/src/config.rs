//! Strategy configuration.
//!
//! A [`StrategyConfig`] is the single immutable description of a strategy:
//! which factors to compute and how to weight them, which names to exclude
//! outright, and the limits the portfolio must respect. Every scoring,
//! construction and backtest call receives its parameters from one of these.

use ronda_construct::{ConstraintSet, Constructor, TiltConfig, WaterFillConfig};
use ronda_eval::{BacktestConfig, BacktestReport, WalkForwardEngine};
use ronda_factors::{FactorDefinition, FactorScorer, FactorWeights, HardFilterSet, ScorerConfig};
use ronda_traits::{
    Date, MarketHistory, Portfolio, PortfolioConstructor, Result, RondaError, Scorer, UniverseSnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Complete configuration of one strategy.
///
/// # Example
///
/// ```
/// use ronda::StrategyConfig;
///
/// let config = StrategyConfig::from_json(
///     r#"{
///         "factors": [
///             { "name": "roe", "source": { "type": "metric", "metric": "roe" } },
///             { "name": "debt_to_equity", "source": { "type": "metric", "metric": "debt_to_equity" }, "risk": true }
///         ],
///         "weights": { "roe": 0.6, "debt_to_equity": 0.4 },
///         "filters": [{ "type": "max_metric", "metric": "debt_to_equity", "max": 3.0 }],
///         "constraints": { "min_position_count": 5, "max_position_count": 20 }
///     }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.constraints.max_weight_per_position, 0.10);
/// assert!(config.build_scorer().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Factors to compute, in breakdown order.
    pub factors: Vec<FactorDefinition>,
    /// Weight per factor name, summing to 1.
    pub weights: FactorWeights,
    /// Hard filters applied before ranking.
    #[serde(default)]
    pub filters: HardFilterSet,
    /// Scoring options.
    #[serde(default)]
    pub scorer: ScorerConfig,
    /// Portfolio limits.
    #[serde(default)]
    pub constraints: ConstraintSet,
    /// Score tilt around equal weight.
    #[serde(default)]
    pub tilt: TiltConfig,
    /// Cap enforcement budget.
    #[serde(default)]
    pub water_fill: WaterFillConfig,
    /// Date range and options for backtests, if this strategy is backtested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtest: Option<BacktestConfig>,
}

impl StrategyConfig {
    /// A configuration with default filters, limits and construction settings.
    #[must_use]
    pub fn new(factors: Vec<FactorDefinition>, weights: FactorWeights) -> Self {
        Self {
            factors,
            weights,
            filters: HardFilterSet::default(),
            scorer: ScorerConfig::default(),
            constraints: ConstraintSet::default(),
            tilt: TiltConfig::default(),
            water_fill: WaterFillConfig::default(),
            backtest: None,
        }
    }

    /// A configuration over built-in factors, weighted as given.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] for an unknown factor name or an
    /// invalid weight vector.
    ///
    /// # Example
    ///
    /// ```
    /// use ronda::StrategyConfig;
    ///
    /// let config = StrategyConfig::from_registry([("roe", 0.5), ("momentum_12_1", 0.3), ("debt_to_equity", 0.2)]).unwrap();
    /// assert!(config.factors.iter().any(|f| f.name == "debt_to_equity" && f.risk));
    /// ```
    pub fn from_registry<'a>(weights: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        let pairs: Vec<(&str, f64)> = weights.into_iter().collect();
        let factors = pairs.iter().map(|(name, _)| FactorDefinition::from_registry(name)).collect::<Result<Vec<_>>>()?;
        let weights = FactorWeights::from_pairs(pairs)?;
        let config = Self::new(factors, weights);
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] for malformed JSON or any
    /// invalid section.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RondaError::Configuration(format!("invalid strategy configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RondaError::Configuration(format!("cannot serialize strategy configuration: {e}")))
    }

    /// Check every section, failing on the first problem.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] describing the problem.
    pub fn validate(&self) -> Result<()> {
        self.build_scorer()?;
        self.build_constructor()?;
        if let Some(backtest) = &self.backtest {
            backtest.validate()?;
        }
        Ok(())
    }

    /// The scorer this configuration describes.
    ///
    /// # Errors
    ///
    /// See [`FactorScorer::with_config`].
    pub fn build_scorer(&self) -> Result<FactorScorer> {
        FactorScorer::with_config(self.factors.clone(), self.weights.clone(), self.filters.clone(), self.scorer)
    }

    /// The constructor this configuration describes.
    ///
    /// # Errors
    ///
    /// See [`Constructor::with_config`].
    pub fn build_constructor(&self) -> Result<Constructor> {
        Constructor::with_config(self.constraints.clone(), self.tilt, self.water_fill)
    }
}

/// Score a snapshot and build its target portfolio.
///
/// # Errors
///
/// Returns configuration, scoring and construction errors.
pub fn target_portfolio(config: &StrategyConfig, universe: &UniverseSnapshot) -> Result<Portfolio> {
    let scorer = config.build_scorer()?;
    let constructor = config.build_constructor()?;
    let outcome = scorer.score(universe)?;
    debug!(as_of = %universe.as_of(), scored = outcome.scores.len(), "Building target portfolio");
    constructor.construct(universe.as_of(), &outcome.scores)
}

/// Backtest a strategy over `history`.
///
/// A `range` overrides the dates of `config.backtest`; without a configured
/// backtest, a quarterly one with default settings runs over `range`.
///
/// # Errors
///
/// Returns [`RondaError::Configuration`] when no date range is available,
/// and any error the engine does not record as a failed period.
pub fn backtest(
    config: &StrategyConfig,
    history: &MarketHistory,
    range: Option<(Date, Date)>,
) -> Result<BacktestReport> {
    let backtest = match (config.backtest.clone(), range) {
        (Some(b), Some((start, end))) => BacktestConfig { start, end, ..b },
        (None, Some((start, end))) => BacktestConfig::new(start, end),
        (Some(b), None) => b,
        (None, None) => return Err(RondaError::Configuration("no backtest date range configured".into())),
    };
    let scorer = config.build_scorer()?;
    let constructor = config.build_constructor()?;
    WalkForwardEngine::new(&scorer, &constructor, history, backtest)?.run()
}
