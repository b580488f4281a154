//! Scorer trait and the score types it produces.
//!
//! A scorer turns a [`UniverseSnapshot`] into composite scores. Instruments
//! failing a hard filter never receive a [`CompositeScore`]; they are listed
//! as [`Exclusion`]s instead, so a favorable factor can never bring them back.

use serde::{Deserialize, Serialize};

use crate::types::{Date, Sector, Ticker};
use crate::universe::UniverseSnapshot;
use crate::Result;

/// One factor's contribution for one instrument on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    /// Factor name.
    pub factor: String,
    /// Raw metric value, `None` when the instrument has no data for it.
    pub raw: Option<f64>,
    /// Percentile rank in [0, 1] within the ranking group, `None` when missing.
    pub normalized: Option<f64>,
    /// Signed contribution to the composite (zero when missing).
    pub contribution: f64,
}

/// Weighted composite score of one instrument on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Instrument identifier.
    pub ticker: Ticker,
    /// Sector label.
    pub sector: Sector,
    /// Weighted sum of factor contributions.
    pub composite: f64,
    /// Number of configured factors with data for this instrument.
    pub coverage: usize,
    /// Per-factor breakdown, in configuration order.
    pub factors: Vec<FactorScore>,
}

impl CompositeScore {
    /// Look up one factor's breakdown by name.
    #[must_use]
    pub fn factor(&self, name: &str) -> Option<&FactorScore> {
        self.factors.iter().find(|f| f.factor == name)
    }
}

/// An instrument removed by a hard filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    /// Instrument identifier.
    pub ticker: Ticker,
    /// Human-readable reason, naming the filter and offending value.
    pub reason: String,
}

/// Result of scoring one universe snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringOutcome {
    /// Evaluation date.
    pub as_of: Date,
    /// Surviving instruments, composite descending, ties by ticker.
    pub scores: Vec<CompositeScore>,
    /// Instruments removed by hard filters, by ticker.
    pub excluded: Vec<Exclusion>,
}

impl ScoringOutcome {
    /// Look up a score by ticker.
    #[must_use]
    pub fn get(&self, ticker: &Ticker) -> Option<&CompositeScore> {
        self.scores.iter().find(|s| &s.ticker == ticker)
    }

    /// Whether `ticker` was removed by a hard filter.
    #[must_use]
    pub fn is_excluded(&self, ticker: &Ticker) -> bool {
        self.excluded.iter().any(|e| &e.ticker == ticker)
    }
}

/// Converts a universe snapshot into composite scores.
///
/// Implementations hold their configuration immutably; scoring the same
/// snapshot twice must return identical outcomes.
///
/// # Example
///
/// ```no_run
/// use ronda_traits::{Result, Scorer, ScoringOutcome, UniverseSnapshot};
///
/// struct NoopScorer;
///
/// impl Scorer for NoopScorer {
///     fn name(&self) -> &str {
///         "noop"
///     }
///
///     fn score(&self, universe: &UniverseSnapshot) -> Result<ScoringOutcome> {
///         Ok(ScoringOutcome { as_of: universe.as_of(), scores: vec![], excluded: vec![] })
///     }
/// }
/// ```
pub trait Scorer: Send + Sync {
    /// Returns the name of this scorer, used in logs.
    fn name(&self) -> &str;

    /// Scores every instrument in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be scored at all; individual
    /// instruments failing filters are reported in
    /// [`ScoringOutcome::excluded`], not as errors.
    fn score(&self, universe: &UniverseSnapshot) -> Result<ScoringOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(ticker: &str, composite: f64) -> CompositeScore {
        CompositeScore {
            ticker: Ticker::new(ticker),
            sector: "Technology".to_string(),
            composite,
            coverage: 1,
            factors: vec![FactorScore {
                factor: "roe".to_string(),
                raw: Some(0.2),
                normalized: Some(composite),
                contribution: composite,
            }],
        }
    }

    #[test]
    fn test_outcome_lookup() {
        let outcome = ScoringOutcome {
            as_of: Date::from_ymd_opt(2024, 1, 2).unwrap(),
            scores: vec![score("AAPL", 0.9), score("MSFT", 0.4)],
            excluded: vec![Exclusion { ticker: Ticker::new("XOM"), reason: "leverage".into() }],
        };
        assert_eq!(outcome.get(&Ticker::new("MSFT")).unwrap().composite, 0.4);
        assert!(outcome.get(&Ticker::new("XOM")).is_none());
        assert!(outcome.is_excluded(&Ticker::new("XOM")));
        assert!(!outcome.is_excluded(&Ticker::new("AAPL")));
    }

    #[test]
    fn test_factor_lookup() {
        let s = score("AAPL", 0.9);
        assert!(s.factor("roe").is_some());
        assert!(s.factor("momentum").is_none());
    }

    #[test]
    fn test_scorer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Scorer>();
    }
}
