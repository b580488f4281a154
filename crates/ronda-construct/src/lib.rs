//! Constrained portfolio construction for ronda.
//!
//! This crate turns ranked composite scores into a target portfolio that
//! respects position-count, per-name, per-sector and sector-diversity limits
//! while staying close to a score-tilted equal weight.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ronda_construct::{ConstraintSet, Constructor, TiltConfig, WaterFillConfig};
//! use ronda_traits::{Date, PortfolioConstructor};
//!
//! let constructor = Constructor::with_config(
//!     ConstraintSet::default(),
//!     TiltConfig { tilt_factor: 0.3, tilt_range: 0.25 },
//!     WaterFillConfig::default(),
//! )
//! .unwrap();
//!
//! # let scored = vec![];
//! let portfolio = constructor.construct(Date::from_ymd_opt(2024, 3, 29).unwrap(), &scored).unwrap();
//! ```

mod constraints;
mod constructor;
mod selection;
mod tilt;
pub mod water_fill;

// Re-export main types
pub use constraints::{CAP_TOLERANCE, ConstraintSet, WEIGHT_SUM_TOLERANCE};
pub use constructor::Constructor;
pub use selection::select_candidates;
pub use tilt::TiltConfig;
pub use water_fill::WaterFillConfig;
