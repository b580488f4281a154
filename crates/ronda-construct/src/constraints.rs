//! Constraint configuration and post-construction checks.

use std::collections::BTreeMap;

use ronda_traits::{Portfolio, Result, RondaError};
use serde::{Deserialize, Serialize};

/// Allowed deviation of a portfolio's weight sum from 1.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Slack granted to position and sector caps when checking a portfolio.
pub const CAP_TOLERANCE: f64 = 1e-9;

/// Hard limits a constructed portfolio must satisfy.
///
/// # Example
///
/// ```
/// use ronda_construct::ConstraintSet;
///
/// let constraints = ConstraintSet {
///     min_position_count: 3,
///     max_position_count: 4,
///     max_weight_per_position: 0.4,
///     max_weight_per_sector: 1.0,
///     ..ConstraintSet::default()
/// };
/// assert!(constraints.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSet {
    /// Fewest holdings a valid portfolio may have.
    pub min_position_count: usize,
    /// Most holdings a valid portfolio may have.
    pub max_position_count: usize,
    /// Cap on any single weight.
    pub max_weight_per_position: f64,
    /// Cap on the summed weight of any sector.
    pub max_weight_per_sector: f64,
    /// Fewest distinct sectors a valid portfolio may hold.
    pub min_sector_count: usize,
    /// Lowest composite score eligible for selection.
    pub min_score: f64,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            min_position_count: 10,
            max_position_count: 25,
            max_weight_per_position: 0.10,
            max_weight_per_sector: 0.35,
            min_sector_count: 3,
            min_score: 0.0,
        }
    }
}

impl ConstraintSet {
    /// Check the limits are coherent on their own.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if the position counts are
    /// inverted or zero, a cap lies outside (0, 1], the minimum score is not
    /// finite, more sectors are required than positions allowed, or even a
    /// full portfolio at the position cap cannot reach 100% invested.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(RondaError::Configuration(msg));
        if self.min_position_count == 0 {
            return fail("min_position_count must be at least 1".into());
        }
        if self.min_position_count > self.max_position_count {
            return fail(format!(
                "min_position_count ({}) exceeds max_position_count ({})",
                self.min_position_count, self.max_position_count
            ));
        }
        for (name, cap) in [
            ("max_weight_per_position", self.max_weight_per_position),
            ("max_weight_per_sector", self.max_weight_per_sector),
        ] {
            if cap.is_nan() || cap <= 0.0 || cap > 1.0 {
                return fail(format!("{name} must lie in (0, 1], got {cap}"));
            }
        }
        if !self.min_score.is_finite() {
            return fail(format!("min_score must be finite, got {}", self.min_score));
        }
        if self.min_sector_count > self.max_position_count {
            return fail(format!(
                "min_sector_count ({}) exceeds max_position_count ({})",
                self.min_sector_count, self.max_position_count
            ));
        }
        let capacity = self.max_position_count as f64 * self.max_weight_per_position;
        if capacity < 1.0 - WEIGHT_SUM_TOLERANCE {
            return fail(format!(
                "max_position_count × max_weight_per_position = {capacity:.4} cannot reach full investment"
            ));
        }
        Ok(())
    }

    /// Every invariant `portfolio` breaks, empty when it is valid.
    #[must_use]
    pub fn violations(&self, portfolio: &Portfolio) -> Vec<String> {
        let mut violations = Vec::new();

        let total = portfolio.total_weight();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            violations.push(format!("weights sum to {total:.9}"));
        }

        let n = portfolio.len();
        if n < self.min_position_count || n > self.max_position_count {
            violations.push(format!(
                "{n} positions outside [{}, {}]",
                self.min_position_count, self.max_position_count
            ));
        }

        for p in portfolio.positions() {
            if p.weight.is_nan() || p.weight <= 0.0 {
                violations.push(format!("{} has non-positive weight {}", p.ticker, p.weight));
            }
            if p.weight > self.max_weight_per_position + CAP_TOLERANCE {
                violations.push(format!(
                    "{} weight {:.6} exceeds position cap {}",
                    p.ticker, p.weight, self.max_weight_per_position
                ));
            }
            if p.composite < self.min_score {
                violations.push(format!("{} score {} below minimum {}", p.ticker, p.composite, self.min_score));
            }
        }

        let sectors: BTreeMap<&str, f64> = portfolio.sector_weights();
        for (sector, weight) in &sectors {
            if *weight > self.max_weight_per_sector + CAP_TOLERANCE {
                violations.push(format!(
                    "sector {sector} weight {weight:.6} exceeds cap {}",
                    self.max_weight_per_sector
                ));
            }
        }
        if sectors.len() < self.min_sector_count {
            violations.push(format!("{} sectors, {} required", sectors.len(), self.min_sector_count));
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda_traits::{Date, Position, Ticker};
    use rstest::rstest;

    fn position(ticker: &str, sector: &str, weight: f64) -> Position {
        Position { ticker: Ticker::new(ticker), sector: sector.into(), weight, composite: 0.5, factors: vec![] }
    }

    fn constraints() -> ConstraintSet {
        ConstraintSet {
            min_position_count: 2,
            max_position_count: 4,
            max_weight_per_position: 0.5,
            max_weight_per_sector: 0.6,
            min_sector_count: 2,
            min_score: 0.1,
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(ConstraintSet::default().validate().is_ok());
    }

    #[rstest]
    #[case(ConstraintSet { min_position_count: 0, ..ConstraintSet::default() })]
    #[case(ConstraintSet { min_position_count: 30, ..ConstraintSet::default() })]
    #[case(ConstraintSet { max_weight_per_position: 0.0, ..ConstraintSet::default() })]
    #[case(ConstraintSet { max_weight_per_sector: 1.5, ..ConstraintSet::default() })]
    #[case(ConstraintSet { min_score: f64::NAN, ..ConstraintSet::default() })]
    #[case(ConstraintSet { min_sector_count: 26, ..ConstraintSet::default() })]
    #[case(ConstraintSet { max_weight_per_position: 0.03, ..ConstraintSet::default() })]
    fn test_validate_rejects(#[case] constraints: ConstraintSet) {
        assert!(matches!(constraints.validate(), Err(RondaError::Configuration(_))));
    }

    #[test]
    fn test_valid_portfolio_has_no_violations() {
        let portfolio = Portfolio::new(
            Date::from_ymd_opt(2024, 1, 2).unwrap(),
            vec![position("AAA", "Tech", 0.4), position("BBB", "Energy", 0.4), position("CCC", "Tech", 0.2)],
        );
        assert!(constraints().violations(&portfolio).is_empty());
    }

    #[test]
    fn test_reports_each_violation() {
        let portfolio = Portfolio::new(
            Date::from_ymd_opt(2024, 1, 2).unwrap(),
            vec![position("AAA", "Tech", 0.7), position("BBB", "Tech", 0.2)],
        );
        let violations = constraints().violations(&portfolio);
        // sum, position cap, sector cap, sector count
        assert_eq!(violations.len(), 4, "{violations:?}");
    }
}
