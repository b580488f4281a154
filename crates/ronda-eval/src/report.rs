//! Backtest report.

use chrono::Datelike;
use polars::prelude::*;
use ronda_traits::{Date, Result};
use serde::{Deserialize, Serialize};

use crate::engine::BacktestConfig;
use crate::ic::IcSummary;
use crate::metrics::{PerformanceMetrics, finite_mean, nan_as_null};
use crate::period::{BacktestPeriod, PeriodOutcome};

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Aggregate results of a walk-forward run.
///
/// Only completed periods feed the metrics; failed periods are kept in
/// [`BacktestReport::periods`] with their cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Scorer used.
    pub scorer: String,
    /// Constructor used.
    pub constructor: String,
    /// Configuration of the run.
    pub config: BacktestConfig,
    /// Every recorded period, in schedule order.
    pub periods: Vec<BacktestPeriod>,
    /// Performance over completed periods.
    pub metrics: PerformanceMetrics,
    /// Rank IC over completed periods.
    pub ic: IcSummary,
    /// Number of completed periods.
    pub completed_periods: usize,
    /// Number of failed periods.
    pub failed_periods: usize,
    /// Mean one-way turnover between consecutive completed portfolios.
    #[serde(with = "nan_as_null")]
    pub average_turnover: f64,
    /// Mean number of holdings.
    #[serde(with = "nan_as_null")]
    pub average_positions: f64,
    /// Whether a stop request ended the run before the schedule did.
    pub stopped_early: bool,
}

impl BacktestReport {
    /// Aggregate recorded periods.
    #[must_use]
    pub fn from_periods(
        scorer: &str,
        constructor: &str,
        config: BacktestConfig,
        periods: Vec<BacktestPeriod>,
        stopped_early: bool,
    ) -> Self {
        let (portfolio, benchmark): (Vec<f64>, Vec<f64>) = periods.iter().filter_map(BacktestPeriod::returns).unzip();
        let metrics = PerformanceMetrics::compute(
            &portfolio,
            &benchmark,
            config.holding_period.periods_per_year(),
            config.risk_free_rate,
        );

        let mut ics = Vec::new();
        let mut turnovers = Vec::new();
        let mut sizes = Vec::new();
        for period in &periods {
            if let PeriodOutcome::Completed { portfolio, turnover, rank_ic, .. } = &period.outcome {
                ics.push(*rank_ic);
                turnovers.extend(*turnover);
                sizes.push(portfolio.len() as f64);
            }
        }

        let completed_periods = portfolio.len();
        Self {
            scorer: scorer.to_string(),
            constructor: constructor.to_string(),
            failed_periods: periods.len() - completed_periods,
            completed_periods,
            config,
            periods,
            metrics,
            ic: IcSummary::from_series(&ics),
            average_turnover: finite_mean(turnovers),
            average_positions: finite_mean(sizes),
            stopped_early,
        }
    }

    /// Portfolio returns of completed periods.
    #[must_use]
    pub fn portfolio_returns(&self) -> Vec<f64> {
        self.periods.iter().filter_map(|p| p.returns().map(|(r, _)| r)).collect()
    }

    /// Benchmark returns of completed periods.
    #[must_use]
    pub fn benchmark_returns(&self) -> Vec<f64> {
        self.periods.iter().filter_map(|p| p.returns().map(|(_, b)| b)).collect()
    }

    /// Alphas of completed periods.
    #[must_use]
    pub fn alphas(&self) -> Vec<f64> {
        self.periods.iter().filter_map(BacktestPeriod::alpha).collect()
    }

    /// One row per period.
    ///
    /// Columns: `rebalance_date`, `holding_end` (dates), `status`,
    /// `portfolio_return`, `benchmark_return`, `alpha`, `turnover`,
    /// `rank_ic`, `positions` and `cause`. Return columns are null for
    /// failed periods.
    ///
    /// # Errors
    ///
    /// Propagates Polars errors from frame assembly.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let n = self.periods.len();
        let mut status = Vec::with_capacity(n);
        let mut portfolio_return = Vec::with_capacity(n);
        let mut benchmark_return = Vec::with_capacity(n);
        let mut alpha = Vec::with_capacity(n);
        let mut turnover = Vec::with_capacity(n);
        let mut rank_ic = Vec::with_capacity(n);
        let mut positions = Vec::with_capacity(n);
        let mut cause = Vec::with_capacity(n);

        for period in &self.periods {
            match &period.outcome {
                PeriodOutcome::Completed {
                    portfolio,
                    portfolio_return: p,
                    benchmark_return: b,
                    alpha: a,
                    turnover: t,
                    rank_ic: ic,
                    ..
                } => {
                    status.push("completed");
                    portfolio_return.push(Some(*p));
                    benchmark_return.push(Some(*b));
                    alpha.push(Some(*a));
                    turnover.push(*t);
                    rank_ic.push(ic.is_finite().then_some(*ic));
                    positions.push(Some(portfolio.len() as u32));
                    cause.push(None);
                }
                PeriodOutcome::Failed { cause: c, .. } => {
                    status.push("failed");
                    portfolio_return.push(None);
                    benchmark_return.push(None);
                    alpha.push(None);
                    turnover.push(None);
                    rank_ic.push(None);
                    positions.push(None);
                    cause.push(Some(c.as_str()));
                }
            }
        }

        let dates = |f: fn(&BacktestPeriod) -> Date| -> Vec<i32> {
            self.periods.iter().map(|p| f(p).num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE).collect()
        };

        let df = DataFrame::new(vec![
            Column::new("rebalance_date".into(), dates(|p| p.rebalance_date)).cast(&DataType::Date)?,
            Column::new("holding_end".into(), dates(|p| p.holding_end)).cast(&DataType::Date)?,
            Column::new("status".into(), status),
            Column::new("portfolio_return".into(), portfolio_return),
            Column::new("benchmark_return".into(), benchmark_return),
            Column::new("alpha".into(), alpha),
            Column::new("turnover".into(), turnover),
            Column::new("rank_ic".into(), rank_ic),
            Column::new("positions".into(), positions),
            Column::new("cause".into(), cause),
        ])?;
        Ok(df)
    }
}
