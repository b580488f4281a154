//! Factor scoring for the ronda multi-factor framework.
//!
//! This crate turns a universe snapshot into ranked composite scores:
//! - Factors: fundamental metrics, trailing momentum and realized volatility
//! - Hard filters: absolute thresholds applied before any ranking
//! - Normalization: average-rank percentiles, universe-wide or per sector
//! - Composite: a validated weight vector, with risk factors inverted
//!
//! # Example
//!
//! ```
//! use ronda_factors::{FactorDefinition, FactorScorer, FactorWeights, HardFilterSet};
//!
//! let scorer = FactorScorer::new(
//!     vec![
//!         FactorDefinition::metric("roe"),
//!         FactorDefinition::metric("debt_to_equity").as_risk(),
//!         FactorDefinition::momentum("momentum_12_1", 252, 21),
//!     ],
//!     FactorWeights::from_pairs([("roe", 0.4), ("debt_to_equity", 0.3), ("momentum_12_1", 0.3)]).unwrap(),
//!     HardFilterSet::new().max_metric("debt_to_equity", 3.0),
//! )
//! .unwrap();
//! assert_eq!(scorer.factors().len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod factor;
pub mod filters;
pub mod normalize;
pub mod registry;
pub mod scorer;
pub mod weights;

// Re-export key types
pub use factor::{FactorDefinition, FactorSource};
pub use filters::{HardFilter, HardFilterSet};
pub use registry::{FactorCategory, FactorInfo, FactorKind};
pub use scorer::{FactorScorer, ScorerConfig};
pub use weights::FactorWeights;
