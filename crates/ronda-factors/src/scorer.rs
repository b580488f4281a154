//! Multi-factor composite scorer.

use std::collections::BTreeSet;

use rayon::prelude::*;
use ronda_traits::{
    CompositeScore, Exclusion, FactorScore, InstrumentRecord, Result, RondaError, Scorer,
    ScoringOutcome, UniverseSnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::factor::FactorDefinition;
use crate::filters::HardFilterSet;
use crate::normalize::{DEFAULT_MIN_BUCKET_SIZE, percentile_normalize, sector_percentile_normalize};
use crate::weights::FactorWeights;

/// Configuration for the factor scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Smallest sector bucket ranked on its own for sector-neutral factors.
    pub min_bucket_size: usize,
    /// Extract raw values and apply filters across instruments in parallel.
    pub parallel: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self { min_bucket_size: DEFAULT_MIN_BUCKET_SIZE, parallel: true }
    }
}

/// Per-instrument result of the filtering stage.
enum Screened<'a> {
    Kept { record: &'a InstrumentRecord, raw: Vec<Option<f64>> },
    Dropped(Exclusion),
}

/// Scores a universe on weighted, percentile-normalized factors.
///
/// The pipeline for one snapshot:
/// 1. extract every factor's raw value per instrument and apply the hard
///    filters, dropping failures before any ranking;
/// 2. percentile-rank each factor across the survivors that have a value,
///    optionally within sector buckets;
/// 3. sum `weight × percentile` (or `weight × (1 − percentile)` for risk
///    factors) into the composite. A missing value contributes zero and the
///    remaining weights are not rescaled.
///
/// Scores come back composite descending, ties broken by ticker.
///
/// # Example
///
/// ```
/// use ronda_factors::{FactorDefinition, FactorScorer, FactorWeights, HardFilterSet};
/// use ronda_traits::{Date, InstrumentRecord, Scorer, UniverseSnapshot};
///
/// let as_of = Date::from_ymd_opt(2024, 3, 29).unwrap();
/// let universe = UniverseSnapshot::new(
///     as_of,
///     vec![
///         InstrumentRecord::new("AAA", "Tech", as_of).with_metric("roe", Some(0.30)),
///         InstrumentRecord::new("BBB", "Tech", as_of).with_metric("roe", Some(0.10)),
///     ],
/// )
/// .unwrap();
///
/// let scorer = FactorScorer::new(
///     vec![FactorDefinition::metric("roe")],
///     FactorWeights::from_pairs([("roe", 1.0)]).unwrap(),
///     HardFilterSet::new(),
/// )
/// .unwrap();
///
/// let outcome = scorer.score(&universe).unwrap();
/// assert_eq!(outcome.scores[0].ticker.as_str(), "AAA");
/// assert_eq!(outcome.scores[0].composite, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct FactorScorer {
    factors: Vec<FactorDefinition>,
    weights: FactorWeights,
    filters: HardFilterSet,
    config: ScorerConfig,
}

impl FactorScorer {
    /// Create a scorer with the default [`ScorerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if no factors are given, factor
    /// names repeat, a factor or filter is invalid, or a weight names a
    /// factor that is not configured.
    pub fn new(factors: Vec<FactorDefinition>, weights: FactorWeights, filters: HardFilterSet) -> Result<Self> {
        Self::with_config(factors, weights, filters, ScorerConfig::default())
    }

    /// Create a scorer with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`FactorScorer::new`].
    pub fn with_config(
        factors: Vec<FactorDefinition>,
        weights: FactorWeights,
        filters: HardFilterSet,
        config: ScorerConfig,
    ) -> Result<Self> {
        if factors.is_empty() {
            return Err(RondaError::Configuration("at least one factor is required".into()));
        }
        let mut seen = BTreeSet::new();
        for factor in &factors {
            factor.validate()?;
            if !seen.insert(factor.name.as_str()) {
                return Err(RondaError::Configuration(format!("factor '{}' configured twice", factor.name)));
            }
        }
        weights.validate_against(&factors)?;
        filters.validate()?;
        if config.min_bucket_size == 0 {
            return Err(RondaError::Configuration("min_bucket_size must be at least 1".into()));
        }
        Ok(Self { factors, weights, filters, config })
    }

    /// The configured factors, in breakdown order.
    #[must_use]
    pub fn factors(&self) -> &[FactorDefinition] {
        &self.factors
    }

    /// The weight vector.
    #[must_use]
    pub const fn weights(&self) -> &FactorWeights {
        &self.weights
    }

    /// The hard filters.
    #[must_use]
    pub const fn filters(&self) -> &HardFilterSet {
        &self.filters
    }

    /// The scorer configuration.
    #[must_use]
    pub const fn config(&self) -> &ScorerConfig {
        &self.config
    }

    fn screen<'a>(&self, record: &'a InstrumentRecord) -> Screened<'a> {
        let raw: Vec<Option<f64>> = self.factors.iter().map(|f| f.raw_value(record)).collect();
        let coverage = raw.iter().filter(|v| v.is_some()).count();
        match self.filters.first_violation(record, coverage) {
            Some(reason) => Screened::Dropped(Exclusion { ticker: record.ticker.clone(), reason }),
            None => Screened::Kept { record, raw },
        }
    }

    fn normalize_factor(&self, factor: &FactorDefinition, values: &[Option<f64>], sectors: &[&str]) -> Vec<Option<f64>> {
        if factor.sector_neutral {
            sector_percentile_normalize(values, sectors, self.config.min_bucket_size)
        } else {
            percentile_normalize(values)
        }
    }
}

impl Scorer for FactorScorer {
    fn name(&self) -> &str {
        "factor_scorer"
    }

    fn score(&self, universe: &UniverseSnapshot) -> Result<ScoringOutcome> {
        let screened: Vec<Screened<'_>> = if self.config.parallel {
            universe.records().par_iter().map(|r| self.screen(r)).collect()
        } else {
            universe.records().iter().map(|r| self.screen(r)).collect()
        };

        let mut survivors = Vec::with_capacity(screened.len());
        let mut raw_rows = Vec::with_capacity(screened.len());
        let mut excluded = Vec::new();
        for item in screened {
            match item {
                Screened::Kept { record, raw } => {
                    survivors.push(record);
                    raw_rows.push(raw);
                }
                Screened::Dropped(exclusion) => {
                    debug!(
                        as_of = %universe.as_of(),
                        ticker = %exclusion.ticker,
                        reason = %exclusion.reason,
                        "Excluded by hard filter"
                    );
                    excluded.push(exclusion);
                }
            }
        }

        let sectors: Vec<&str> = survivors.iter().map(|r| r.sector.as_str()).collect();
        let normalized: Vec<Vec<Option<f64>>> = self
            .factors
            .iter()
            .enumerate()
            .map(|(j, factor)| {
                let column: Vec<Option<f64>> = raw_rows.iter().map(|row| row[j]).collect();
                self.normalize_factor(factor, &column, &sectors)
            })
            .collect();

        let mut scores: Vec<CompositeScore> = survivors
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let factors: Vec<FactorScore> = self
                    .factors
                    .iter()
                    .enumerate()
                    .map(|(j, factor)| {
                        let pct = normalized[j][i];
                        let weight = self.weights.get(&factor.name);
                        let contribution = pct.map_or(0.0, |p| {
                            if factor.risk { weight * (1.0 - p) } else { weight * p }
                        });
                        FactorScore { factor: factor.name.clone(), raw: raw_rows[i][j], normalized: pct, contribution }
                    })
                    .collect();
                CompositeScore {
                    ticker: record.ticker.clone(),
                    sector: record.sector.clone(),
                    composite: factors.iter().map(|f| f.contribution).sum(),
                    coverage: raw_rows[i].iter().filter(|v| v.is_some()).count(),
                    factors,
                }
            })
            .collect();

        scores.sort_by(|a, b| b.composite.total_cmp(&a.composite).then_with(|| a.ticker.cmp(&b.ticker)));

        info!(
            as_of = %universe.as_of(),
            universe = universe.len(),
            scored = scores.len(),
            excluded = excluded.len(),
            "Scored universe"
        );

        Ok(ScoringOutcome { as_of: universe.as_of(), scores, excluded })
    }
}
