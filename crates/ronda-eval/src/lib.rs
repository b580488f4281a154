//! Walk-forward backtesting and performance evaluation for ronda.
//!
//! This crate provides:
//! - Rebalancing schedules aligned to calendar quarters, months or day counts
//! - A walk-forward engine that replays a scorer and constructor without look-ahead
//! - Performance metrics (CAGR, alpha, Sharpe, information ratio, drawdown)
//! - Rank information coefficient between scores and realized returns
//!
//! # Example
//!
//! ```
//! use ronda_eval::{PerformanceMetrics, metrics};
//!
//! let portfolio = [0.05, -0.02];
//! let benchmark = [0.03, 0.00];
//!
//! let alpha = metrics::alpha_series(&portfolio, &benchmark);
//! assert_eq!(metrics::hit_rate(&alpha), 0.5);
//!
//! let summary = PerformanceMetrics::compute(&portfolio, &benchmark, 4.0, 0.0);
//! assert!(summary.cumulative_alpha.abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod engine;
pub mod ic;
pub mod metrics;
pub mod period;
pub mod report;
pub mod schedule;

// Re-export main types
pub use engine::{BacktestConfig, EngineState, StopHandle, WalkForwardEngine};
pub use ic::{IcSummary, rank_ic};
pub use metrics::PerformanceMetrics;
pub use period::{BacktestPeriod, FailureKind, PeriodOutcome};
pub use report::BacktestReport;
pub use schedule::{HoldingPeriod, RebalanceSchedule, ScheduledPeriod};
