#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core data model and trait definitions for the ronda multi-factor framework.
//!
//! This crate provides the foundational abstractions shared by the scoring,
//! construction and evaluation crates: point-in-time instrument records,
//! universe snapshots, composite scores, portfolios, the error taxonomy and
//! the [`Scorer`] / [`PortfolioConstructor`] seams.

/// The version of the ronda-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod constructor;
pub mod error;
pub mod frame;
pub mod portfolio;
pub mod scorer;
pub mod stats;
pub mod types;
pub mod universe;

// Re-exports
pub use constructor::PortfolioConstructor;
pub use error::{Result, RondaError};
pub use portfolio::{Portfolio, Position};
pub use scorer::{CompositeScore, Exclusion, FactorScore, Scorer, ScoringOutcome};
pub use types::{Date, InstrumentRecord, PricePoint, PriceSeries, Sector, Ticker};
pub use universe::{MarketHistory, UniverseSnapshot};
