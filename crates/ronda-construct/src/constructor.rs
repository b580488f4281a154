//! The constrained portfolio constructor.

use ronda_traits::{CompositeScore, Date, Portfolio, PortfolioConstructor, Position, Result, RondaError};
use tracing::{debug, info};

use crate::constraints::ConstraintSet;
use crate::selection::select_candidates;
use crate::tilt::TiltConfig;
use crate::water_fill::{Caps, WaterFillConfig, water_fill};

/// Builds score-tilted portfolios that honor a [`ConstraintSet`].
///
/// Construction runs in four steps:
/// 1. select the top names by composite, enforcing the sector minimum and
///    making sure the caps can add up to a fully invested portfolio;
/// 2. start from equal weight tilted toward higher scores;
/// 3. water-fill until every position and sector cap holds;
/// 4. verify every portfolio invariant before returning.
///
/// # Example
///
/// ```
/// use ronda_construct::{ConstraintSet, Constructor};
/// use ronda_traits::{CompositeScore, Date, PortfolioConstructor, Ticker};
///
/// let scored: Vec<CompositeScore> = [("A", 0.9), ("B", 0.8), ("C", 0.7), ("D", 0.6), ("E", 0.1)]
///     .into_iter()
///     .map(|(t, s)| CompositeScore {
///         ticker: Ticker::new(t),
///         sector: format!("Sector{t}"),
///         composite: s,
///         coverage: 1,
///         factors: vec![],
///     })
///     .collect();
///
/// let constructor = Constructor::new(ConstraintSet {
///     min_position_count: 3,
///     max_position_count: 4,
///     max_weight_per_position: 0.4,
///     max_weight_per_sector: 1.0,
///     min_sector_count: 0,
///     min_score: 0.0,
/// })
/// .unwrap();
///
/// let portfolio = constructor.construct(Date::from_ymd_opt(2024, 3, 29).unwrap(), &scored).unwrap();
/// assert_eq!(portfolio.len(), 4);
/// assert!((portfolio.total_weight() - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constructor {
    constraints: ConstraintSet,
    tilt: TiltConfig,
    water_fill: WaterFillConfig,
}

impl Constructor {
    /// Create a constructor with the default tilt and water-filling settings.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if the constraint set is invalid.
    pub fn new(constraints: ConstraintSet) -> Result<Self> {
        Self::with_config(constraints, TiltConfig::default(), WaterFillConfig::default())
    }

    /// Create a constructor with explicit tilt and water-filling settings.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if any part is invalid.
    pub fn with_config(constraints: ConstraintSet, tilt: TiltConfig, water_fill: WaterFillConfig) -> Result<Self> {
        constraints.validate()?;
        tilt.validate()?;
        water_fill.validate()?;
        Ok(Self { constraints, tilt, water_fill })
    }

    /// The constraint set.
    #[must_use]
    pub const fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// The tilt configuration.
    #[must_use]
    pub const fn tilt(&self) -> &TiltConfig {
        &self.tilt
    }

    /// The water-filling configuration.
    #[must_use]
    pub const fn water_fill_config(&self) -> &WaterFillConfig {
        &self.water_fill
    }
}

impl PortfolioConstructor for Constructor {
    fn name(&self) -> &str {
        "constrained_tilt"
    }

    fn construct(&self, as_of: Date, scored: &[CompositeScore]) -> Result<Portfolio> {
        let selected = select_candidates(as_of, scored, &self.constraints)?;
        debug!(%as_of, eligible = scored.len(), selected = selected.len(), "Selected candidates");

        let scores: Vec<f64> = selected.iter().map(|s| s.composite).collect();
        let sectors: Vec<&str> = selected.iter().map(|s| s.sector.as_str()).collect();
        let mut weights = self.tilt.weights(&scores);

        let caps = Caps {
            position: self.constraints.max_weight_per_position,
            sector: self.constraints.max_weight_per_sector,
        };
        let passes = water_fill(as_of, &mut weights, &sectors, caps, &self.water_fill)?;
        debug!(%as_of, passes, "Weights converged");

        let positions = selected
            .iter()
            .zip(weights)
            .map(|(s, weight)| Position {
                ticker: s.ticker.clone(),
                sector: s.sector.clone(),
                weight,
                composite: s.composite,
                factors: s.factors.clone(),
            })
            .collect();
        let portfolio = Portfolio::new(as_of, positions);

        let violations = self.constraints.violations(&portfolio);
        if !violations.is_empty() {
            return Err(RondaError::InvariantViolation { date: as_of, detail: violations.join("; ") });
        }

        info!(
            %as_of,
            positions = portfolio.len(),
            sectors = portfolio.sector_count(),
            max_weight = portfolio.weights().into_iter().fold(0.0, f64::max),
            effective_names = portfolio.effective_names(),
            "Constructed portfolio"
        );

        Ok(portfolio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_traits::Ticker;

    fn date() -> Date {
        Date::from_ymd_opt(2024, 3, 29).unwrap()
    }

    fn score(ticker: &str, sector: &str, composite: f64) -> CompositeScore {
        CompositeScore { ticker: Ticker::new(ticker), sector: sector.into(), composite, coverage: 1, factors: vec![] }
    }

    #[test]
    fn test_position_capacity_precheck() {
        let constructor = Constructor::new(ConstraintSet {
            min_position_count: 2,
            max_position_count: 10,
            max_weight_per_position: 0.2,
            max_weight_per_sector: 1.0,
            min_sector_count: 0,
            min_score: 0.0,
        })
        .unwrap();
        let scored = vec![score("A", "S1", 0.9), score("B", "S2", 0.8), score("C", "S3", 0.7)];
        let err = constructor.construct(date(), &scored).unwrap_err();
        assert!(matches!(err, RondaError::InfeasibleConstraint { .. }), "{err}");
    }

    #[test]
    fn test_sector_capacity_precheck() {
        let constructor = Constructor::new(ConstraintSet {
            min_position_count: 2,
            max_position_count: 4,
            max_weight_per_position: 0.5,
            max_weight_per_sector: 0.4,
            min_sector_count: 0,
            min_score: 0.0,
        })
        .unwrap();
        let scored = vec![
            score("A", "Tech", 0.9),
            score("B", "Tech", 0.8),
            score("C", "Energy", 0.7),
            score("D", "Energy", 0.6),
        ];
        let err = constructor.construct(date(), &scored).unwrap_err();
        assert!(matches!(err, RondaError::InfeasibleConstraint { .. }), "{err}");
    }

    #[test]
    fn test_sector_cap_binds() {
        let constructor = Constructor::new(ConstraintSet {
            min_position_count: 4,
            max_position_count: 4,
            max_weight_per_position: 0.4,
            max_weight_per_sector: 0.6,
            min_sector_count: 2,
            min_score: 0.0,
        })
        .unwrap();
        let scored = vec![
            score("A", "Tech", 0.9),
            score("B", "Tech", 0.8),
            score("C", "Tech", 0.7),
            score("D", "Energy", 0.6),
        ];
        let portfolio = constructor.construct(date(), &scored).unwrap();
        let sectors = portfolio.sector_weights();
        assert_relative_eq!(sectors["Tech"], 0.6, epsilon = 1e-9);
        assert_relative_eq!(portfolio.weight(&Ticker::new("D")), 0.4, epsilon = 1e-9);
        assert!(portfolio.weights().iter().all(|w| *w <= 0.4 + 1e-9));
        assert_relative_eq!(portfolio.total_weight(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sector_concentrated_ranking_still_builds() {
        let mut scored: Vec<CompositeScore> =
            (0..20).map(|i| score(&format!("T{i:02}"), "Tech", 0.99 - 0.01 * i as f64)).collect();
        for (k, sector) in ["Energy", "Utilities", "Health"].into_iter().enumerate() {
            for i in 0..10 {
                scored.push(score(&format!("{}{i:02}", &sector[..1]), sector, 0.70 - 0.1 * k as f64 - 0.005 * i as f64));
            }
        }

        let constructor = Constructor::new(ConstraintSet::default()).unwrap();
        let portfolio = constructor.construct(date(), &scored).unwrap();

        assert!(constructor.constraints().violations(&portfolio).is_empty());
        assert_eq!(portfolio.len(), 25);
        let sectors = portfolio.sector_weights();
        assert_relative_eq!(sectors["Tech"], 0.35, epsilon = 1e-9);
        assert_relative_eq!(sectors["Energy"], 0.35, epsilon = 1e-9);
        assert_relative_eq!(sectors["Utilities"], 0.30, epsilon = 1e-9);
        assert!(portfolio.weights().iter().all(|w| *w > 0.0 && *w <= 0.10 + 1e-9));
        assert_relative_eq!(portfolio.total_weight(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_default_constructor_is_valid() {
        let constructor = Constructor::default();
        assert!(constructor.constraints().validate().is_ok());
        assert_eq!(constructor.water_fill_config().max_passes, 50);
        assert_eq!(constructor.name(), "constrained_tilt");
    }
}
