//! Error types for the ronda framework.
//!
//! Every failure the scoring, construction and backtest stages can raise is a
//! variant of [`RondaError`]. Variants carry the as-of date and, where one is
//! involved, the offending ticker so a failure can be reproduced from the
//! error alone.

use thiserror::Error;

use crate::types::{Date, Ticker};

/// The main error type for ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// Invalid strategy configuration (weights, factor names, constraint bounds).
    ///
    /// Raised at load time, before any scoring runs.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Fewer eligible instruments than the minimum position count.
    #[error("Insufficient candidates on {date}: {available} eligible, {required} required")]
    InsufficientCandidates {
        /// As-of date of the construction call.
        date: Date,
        /// Number of instruments meeting the minimum score.
        available: usize,
        /// Minimum position count.
        required: usize,
    },

    /// The constraint set cannot be satisfied by the eligible universe.
    #[error("Infeasible constraints on {date}: {reason}")]
    InfeasibleConstraint {
        /// As-of date of the construction call.
        date: Date,
        /// What made the constraint set infeasible.
        reason: String,
    },

    /// The cap-and-redistribute loop exhausted its pass budget.
    #[error(
        "Constraint enforcement did not converge on {date} after {iterations} passes (last change {residual:.3e})"
    )]
    ConstraintNotConverged {
        /// As-of date of the construction call.
        date: Date,
        /// Passes performed.
        iterations: usize,
        /// Largest weight change observed in the final pass.
        residual: f64,
    },

    /// A backtest period lacks the data needed for a realized return.
    #[error("Period data error on {date}: {reason}")]
    PeriodData {
        /// Rebalancing date of the period.
        date: Date,
        /// Ticker whose data is missing, if the failure concerns one instrument.
        ticker: Option<Ticker>,
        /// Description of the missing data.
        reason: String,
    },

    /// Data dated after the as-of date reached the scorer.
    #[error("Look-ahead violation: {ticker} carries data dated {found}, after as-of date {as_of}")]
    LookAhead {
        /// The as-of date being evaluated.
        as_of: Date,
        /// Ticker carrying the offending data.
        ticker: Ticker,
        /// Date of the offending observation.
        found: Date,
    },

    /// A constructed portfolio failed its post-condition check.
    #[error("Portfolio invariant violated on {date}: {detail}")]
    InvariantViolation {
        /// As-of date of the portfolio.
        date: Date,
        /// Which invariant failed and by how much.
        detail: String,
    },

    /// Error due to invalid or malformed input data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from a frame.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl RondaError {
    /// Returns whether a backtest may record this error as a failed period and
    /// continue with the next one.
    ///
    /// Only data-dependent failures qualify. Configuration problems, look-ahead
    /// violations, non-convergence and invariant violations are defects of the
    /// run itself and abort it.
    #[must_use]
    pub const fn is_period_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PeriodData { .. } | Self::InsufficientCandidates { .. } | Self::InfeasibleConstraint { .. }
        )
    }
}

impl From<String> for RondaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for RondaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for ronda operations.
///
/// This is a convenience type that uses [`RondaError`] as the error type.
pub type Result<T> = std::result::Result<T, RondaError>;
