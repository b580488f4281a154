//! Per-period backtest records.

use ronda_traits::{Date, Portfolio, RondaError};
use serde::{Deserialize, Serialize};

use crate::metrics::nan_as_null;

/// Why a period produced no realized return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Fewer eligible names than the minimum position count.
    InsufficientCandidates,
    /// The constraint set could not be met by the eligible names.
    InfeasibleConstraint,
    /// A price needed for a realized return was missing or unusable.
    PeriodData,
    /// Anything else the engine chose to record rather than abort on.
    Other,
}

impl From<&RondaError> for FailureKind {
    fn from(err: &RondaError) -> Self {
        match err {
            RondaError::InsufficientCandidates { .. } => Self::InsufficientCandidates,
            RondaError::InfeasibleConstraint { .. } => Self::InfeasibleConstraint,
            RondaError::PeriodData { .. } => Self::PeriodData,
            _ => Self::Other,
        }
    }
}

/// What happened in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeriodOutcome {
    /// The portfolio was built and held, and both returns were realized.
    Completed {
        /// Portfolio held over the period.
        portfolio: Portfolio,
        /// Σ weight × constituent holding-period return.
        portfolio_return: f64,
        /// Benchmark return over the same window.
        benchmark_return: f64,
        /// `portfolio_return − benchmark_return`.
        alpha: f64,
        /// One-way turnover from the previous completed portfolio.
        turnover: Option<f64>,
        /// Rank IC across all scored names with usable prices.
        #[serde(with = "nan_as_null")]
        rank_ic: f64,
        /// Names that received a composite score.
        scored: usize,
        /// Names removed by hard filters.
        excluded: usize,
    },
    /// The period was recorded with its cause and left out of aggregates.
    Failed {
        /// Failure category.
        kind: FailureKind,
        /// Rendered error.
        cause: String,
    },
}

/// One walk-forward step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestPeriod {
    /// Position in the schedule, from zero.
    pub index: usize,
    /// Date the portfolio was built on.
    pub rebalance_date: Date,
    /// Date the portfolio was marked.
    pub holding_end: Date,
    /// Result of the period.
    pub outcome: PeriodOutcome,
}

impl BacktestPeriod {
    /// Record a failed period.
    #[must_use]
    pub fn failed(index: usize, rebalance_date: Date, holding_end: Date, err: &RondaError) -> Self {
        Self {
            index,
            rebalance_date,
            holding_end,
            outcome: PeriodOutcome::Failed { kind: FailureKind::from(err), cause: err.to_string() },
        }
    }

    /// Whether the period completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.outcome, PeriodOutcome::Completed { .. })
    }

    /// `(portfolio_return, benchmark_return)` of a completed period.
    #[must_use]
    pub const fn returns(&self) -> Option<(f64, f64)> {
        match &self.outcome {
            PeriodOutcome::Completed { portfolio_return, benchmark_return, .. } => {
                Some((*portfolio_return, *benchmark_return))
            }
            PeriodOutcome::Failed { .. } => None,
        }
    }

    /// Alpha of a completed period.
    #[must_use]
    pub const fn alpha(&self) -> Option<f64> {
        match &self.outcome {
            PeriodOutcome::Completed { alpha, .. } => Some(*alpha),
            PeriodOutcome::Failed { .. } => None,
        }
    }

    /// Portfolio held in a completed period.
    #[must_use]
    pub const fn portfolio(&self) -> Option<&Portfolio> {
        match &self.outcome {
            PeriodOutcome::Completed { portfolio, .. } => Some(portfolio),
            PeriodOutcome::Failed { .. } => None,
        }
    }
}
