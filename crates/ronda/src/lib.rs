#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # ronda
//!
//! Multi-factor equity ranking, constrained portfolio construction and
//! walk-forward backtesting.
//!
//! ronda is an umbrella crate that re-exports the ronda sub-crates and adds
//! [`StrategyConfig`], the immutable description of a strategy every call
//! is parameterized by.
//!
//! ## Quick Start
//!
//! ```
//! use ronda::prelude::*;
//!
//! # fn main() -> ronda::Result<()> {
//! let date = Date::from_ymd_opt(2024, 3, 29).unwrap();
//! let records = ["AAA", "BBB", "CCC", "DDD", "EEE"]
//!     .iter()
//!     .zip([0.30, 0.25, 0.20, 0.15, 0.02])
//!     .zip(["Tech", "Energy", "Health", "Utilities", "Tech"])
//!     .map(|((t, roe), sector)| InstrumentRecord::new(*t, sector, date).with_metric("roe", Some(roe)))
//!     .collect();
//! let universe = UniverseSnapshot::new(date, records)?;
//!
//! let mut config = StrategyConfig::from_registry([("roe", 1.0)])?;
//! config.constraints = ConstraintSet {
//!     min_position_count: 3,
//!     max_position_count: 4,
//!     max_weight_per_position: 0.4,
//!     max_weight_per_sector: 1.0,
//!     min_sector_count: 0,
//!     min_score: 0.0,
//! };
//!
//! let portfolio = ronda::target_portfolio(&config, &universe)?;
//! assert_eq!(portfolio.len(), 4);
//! assert!((portfolio.total_weight() - 1.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Data model, error taxonomy and the [`Scorer`] / [`PortfolioConstructor`] seams
//! - [`factors`] - Factor definitions, hard filters, percentile normalization, composite scoring
//! - [`construct`] - Candidate selection, score tilt and cap enforcement
//! - [`eval`] - Walk-forward engine, schedules, metrics and reports
//!
//! ## Architecture
//!
//! 1. **Scorer** filters the universe, ranks every factor cross-sectionally and combines the
//!    percentiles into a composite score
//! 2. **Constructor** selects the best names, tilts equal weight toward higher scores and
//!    enforces position and sector caps
//! 3. **Engine** replays both through history one holding period at a time, using only data
//!    dated on or before each rebalancing date
//! 4. **Metrics** aggregate the realized returns against the benchmark

/// Version information for the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;

pub use config::{StrategyConfig, backtest, target_portfolio};

// ============================================================================
// Core Traits
// ============================================================================

/// Data model, errors and trait seams.
///
/// - [`Scorer`] - turns a universe snapshot into composite scores
/// - [`PortfolioConstructor`] - turns composite scores into a portfolio
pub mod traits {
    pub use ronda_traits::*;
}

pub use ronda_traits::{PortfolioConstructor, Scorer};

// Re-export error types
pub use ronda_traits::{Result, RondaError};

// Re-export common types
pub use ronda_traits::{
    CompositeScore, Date, InstrumentRecord, MarketHistory, Portfolio, Position, PriceSeries, ScoringOutcome,
    Ticker, UniverseSnapshot,
};

// ============================================================================
// Scoring
// ============================================================================

/// Factor scoring.
///
/// Fourteen built-in factors are available by name across six categories:
///
/// - **Momentum**: 12-1 and 6-month price momentum
/// - **Value**: earnings yield, free-cash-flow yield, book-to-price
/// - **Quality**: ROE, ROIC, gross margin, interest coverage
/// - **Growth**: revenue and EPS growth
/// - **Risk**: debt-to-equity and 3-month volatility, where lower is better
/// - **Liquidity**: average dollar volume
///
/// # Example
///
/// ```
/// use ronda::factors::registry::{FactorCategory, factors_by_category};
///
/// assert_eq!(factors_by_category(FactorCategory::Risk).len(), 2);
/// ```
pub mod factors {
    pub use ronda_factors::*;
}

// ============================================================================
// Construction
// ============================================================================

/// Constrained portfolio construction.
///
/// Equal weight is tilted toward higher composites by
/// `1 + tilt_factor × z`, clipped to `1 ± tilt_range`, then water-filled:
/// capped positions and sectors hand their excess to names still under
/// their caps until nothing moves.
pub mod construct {
    pub use ronda_construct::*;
}

// ============================================================================
// Evaluation
// ============================================================================

/// Walk-forward backtesting and metrics.
///
/// ## Key Metrics
///
/// ```text
/// alpha_t = r_portfolio,t − r_benchmark,t
/// IR      = (CAGR_portfolio − CAGR_benchmark) / (std(alpha) × √periods_per_year)
/// MDD     = min_t (cum_t / peak_t − 1)
/// ```
///
/// Metrics over empty or constant series are `NaN`, serialized as `null`.
pub mod eval {
    pub use ronda_eval::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```
/// use ronda::prelude::*;
/// ```
pub mod prelude {
    pub use crate::StrategyConfig;
    pub use crate::construct::{ConstraintSet, Constructor, TiltConfig};
    pub use crate::eval::{BacktestConfig, BacktestReport, HoldingPeriod, PerformanceMetrics, WalkForwardEngine};
    pub use crate::factors::{FactorDefinition, FactorScorer, FactorWeights, HardFilter, HardFilterSet};
    pub use crate::traits::*;
}

// ============================================================================
// Tests
// ============================================================================
