//! Walk-forward backtest engine.
//!
//! The engine replays a strategy one holding period at a time. For each
//! scheduled window it cuts the universe as known on the rebalancing date,
//! scores and constructs with frozen parameters, holds the portfolio to the
//! end of the window and records the realized returns. Periods run strictly
//! in sequence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ronda_traits::{
    Date, MarketHistory, Portfolio, PortfolioConstructor, PriceSeries, Result, RondaError, Scorer, Ticker,
    UniverseSnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ic::rank_ic;
use crate::period::{BacktestPeriod, PeriodOutcome};
use crate::report::BacktestReport;
use crate::schedule::{HoldingPeriod, RebalanceSchedule, ScheduledPeriod};

const fn default_max_record_age_days() -> i64 {
    120
}

const fn default_max_price_staleness_days() -> i64 {
    7
}

/// Backtest configuration.
///
/// Only the date range is required; everything else has a default.
///
/// # Example
///
/// ```
/// use ronda_eval::{BacktestConfig, HoldingPeriod};
///
/// let config: BacktestConfig =
///     serde_json::from_str(r#"{ "start": "2020-01-01", "end": "2023-12-31" }"#).unwrap();
/// assert_eq!(config.holding_period, HoldingPeriod::Quarter);
/// assert_eq!(config.max_record_age_days, 120);
/// assert!(!config.halt_on_construction_error);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// First date a period may start on.
    pub start: Date,
    /// Last date a period may end on.
    pub end: Date,
    /// Length of each holding period.
    #[serde(default)]
    pub holding_period: HoldingPeriod,
    /// Annual risk-free rate used by Sharpe and Sortino.
    #[serde(default)]
    pub risk_free_rate: f64,
    /// Oldest instrument record, in days, still usable on a rebalancing date.
    #[serde(default = "default_max_record_age_days")]
    pub max_record_age_days: i64,
    /// Oldest price, in days, still usable to mark a position.
    #[serde(default = "default_max_price_staleness_days")]
    pub max_price_staleness_days: i64,
    /// Abort the run when construction fails instead of recording a failed
    /// period.
    #[serde(default)]
    pub halt_on_construction_error: bool,
}

impl BacktestConfig {
    /// A quarterly backtest over `[start, end]` with default settings.
    #[must_use]
    pub const fn new(start: Date, end: Date) -> Self {
        Self {
            start,
            end,
            holding_period: HoldingPeriod::Quarter,
            risk_free_rate: 0.0,
            max_record_age_days: default_max_record_age_days(),
            max_price_staleness_days: default_max_price_staleness_days(),
            halt_on_construction_error: false,
        }
    }

    /// Set the holding period.
    #[must_use]
    pub const fn with_holding_period(mut self, holding_period: HoldingPeriod) -> Self {
        self.holding_period = holding_period;
        self
    }

    /// Set the annual risk-free rate.
    #[must_use]
    pub const fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] for an inverted date range, an
    /// invalid holding period, negative staleness limits or a non-finite
    /// risk-free rate.
    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(RondaError::Configuration(format!(
                "backtest start {} is after end {}",
                self.start, self.end
            )));
        }
        self.holding_period.validate()?;
        if self.max_record_age_days < 0 || self.max_price_staleness_days < 0 {
            return Err(RondaError::Configuration("staleness limits must be non-negative".into()));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(RondaError::Configuration(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        Ok(())
    }
}

/// Cooperative cancellation for a running backtest.
///
/// The engine checks the flag once per period; a period already in progress
/// runs to completion.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request a stop.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Where the engine is in its schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No period has run yet.
    Idle,
    /// Periods before `next_period` have been recorded.
    Running {
        /// Schedule index of the next period to run.
        next_period: usize,
    },
    /// Every period ran, or a stop was requested.
    Completed,
}

/// Walks a [`Scorer`] and a [`PortfolioConstructor`] forward through history.
///
/// # Example
///
/// ```no_run
/// use ronda_construct::Constructor;
/// use ronda_eval::{BacktestConfig, WalkForwardEngine};
/// use ronda_factors::{FactorDefinition, FactorScorer, FactorWeights, HardFilterSet};
/// use ronda_traits::{Date, MarketHistory};
///
/// # fn history() -> MarketHistory { MarketHistory::default() }
/// let scorer = FactorScorer::new(
///     vec![FactorDefinition::metric("roe")],
///     FactorWeights::equal(["roe"]).unwrap(),
///     HardFilterSet::default(),
/// )
/// .unwrap();
/// let constructor = Constructor::default();
/// let history = history();
/// let config = BacktestConfig::new(
///     Date::from_ymd_opt(2020, 1, 1).unwrap(),
///     Date::from_ymd_opt(2024, 1, 1).unwrap(),
/// );
///
/// let report = WalkForwardEngine::new(&scorer, &constructor, &history, config).unwrap().run().unwrap();
/// println!("{:.2}% annualized alpha", report.metrics.annualized_alpha * 100.0);
/// ```
pub struct WalkForwardEngine<'a> {
    scorer: &'a dyn Scorer,
    constructor: &'a dyn PortfolioConstructor,
    history: &'a MarketHistory,
    config: BacktestConfig,
    schedule: RebalanceSchedule,
    state: EngineState,
    periods: Vec<BacktestPeriod>,
    previous: Option<Portfolio>,
    stop: StopHandle,
    stopped_early: bool,
}

impl std::fmt::Debug for WalkForwardEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkForwardEngine")
            .field("scorer", &self.scorer.name())
            .field("constructor", &self.constructor.name())
            .field("config", &self.config)
            .field("state", &self.state)
            .field("periods", &self.periods.len())
            .finish_non_exhaustive()
    }
}

impl<'a> WalkForwardEngine<'a> {
    /// Create an engine and enumerate its schedule.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if the configuration is invalid.
    pub fn new(
        scorer: &'a dyn Scorer,
        constructor: &'a dyn PortfolioConstructor,
        history: &'a MarketHistory,
        config: BacktestConfig,
    ) -> Result<Self> {
        config.validate()?;
        let schedule = RebalanceSchedule::new(config.start, config.end, config.holding_period)?;
        Ok(Self {
            scorer,
            constructor,
            history,
            config,
            schedule,
            state: EngineState::Idle,
            periods: Vec::new(),
            previous: None,
            stop: StopHandle::default(),
            stopped_early: false,
        })
    }

    /// A handle that stops the run after the current period.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// The schedule being walked.
    #[must_use]
    pub const fn schedule(&self) -> &RebalanceSchedule {
        &self.schedule
    }

    /// The configuration in force.
    #[must_use]
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Periods recorded so far.
    #[must_use]
    pub fn periods(&self) -> &[BacktestPeriod] {
        &self.periods
    }

    /// Run the next scheduled period and return its record.
    ///
    /// Returns `Ok(None)` once the schedule is exhausted or a stop was
    /// requested, moving the engine to [`EngineState::Completed`].
    ///
    /// # Errors
    ///
    /// Returns any error that is not recorded as a failed period: look-ahead
    /// and invariant violations, non-convergence and configuration errors
    /// always, construction errors when `halt_on_construction_error` is set.
    pub fn step(&mut self) -> Result<Option<&BacktestPeriod>> {
        let index = match self.state {
            EngineState::Completed => return Ok(None),
            EngineState::Idle => 0,
            EngineState::Running { next_period } => next_period,
        };
        if self.stop.is_stopped() {
            info!(period = index, "Stop requested, ending backtest");
            self.stopped_early = index < self.schedule.len();
            self.state = EngineState::Completed;
            return Ok(None);
        }
        let Some(window) = self.schedule.periods().get(index).copied() else {
            self.state = EngineState::Completed;
            return Ok(None);
        };
        self.state = EngineState::Running { next_period: index };

        let period = match self
            .history
            .as_of(window.rebalance_date, self.config.max_record_age_days)
            .and_then(|snapshot| self.run_period_with_snapshot(index, window, &snapshot))
        {
            Ok(period) => period,
            Err(err) if self.records_as_failure(&err) => {
                warn!(
                    period = index,
                    date = %window.rebalance_date,
                    error = %err,
                    "Period failed, continuing"
                );
                BacktestPeriod::failed(index, window.rebalance_date, window.holding_end, &err)
            }
            Err(err) => return Err(err),
        };

        if let Some(portfolio) = period.portfolio() {
            self.previous = Some(portfolio.clone());
        }
        self.periods.push(period);
        self.state = EngineState::Running { next_period: index + 1 };
        Ok(self.periods.last())
    }

    /// Run every remaining period and build the report.
    ///
    /// # Errors
    ///
    /// Propagates the first error [`Self::step`] does not record.
    pub fn run(mut self) -> Result<BacktestReport> {
        info!(
            scorer = self.scorer.name(),
            constructor = self.constructor.name(),
            periods = self.schedule.len(),
            start = %self.config.start,
            end = %self.config.end,
            "Starting walk-forward backtest"
        );
        while self.step()?.is_some() {}

        let report = self.report();
        info!(
            completed = report.completed_periods,
            failed = report.failed_periods,
            stopped_early = report.stopped_early,
            cumulative_return = report.metrics.cumulative_return,
            annualized_alpha = report.metrics.annualized_alpha,
            sharpe = report.metrics.sharpe_ratio,
            max_drawdown = report.metrics.max_drawdown,
            "Backtest complete"
        );
        Ok(report)
    }

    /// Aggregate the periods recorded so far.
    #[must_use]
    pub fn report(&self) -> BacktestReport {
        BacktestReport::from_periods(
            self.scorer.name(),
            self.constructor.name(),
            self.config.clone(),
            self.periods.clone(),
            self.stopped_early,
        )
    }

    /// Evaluate one window on a caller-supplied snapshot.
    ///
    /// The snapshot is rejected, not filtered, if anything in it is dated
    /// after the rebalancing date. Turnover is measured against the last
    /// completed portfolio; engine state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::LookAhead`] for a snapshot carrying future data,
    /// [`RondaError::PeriodData`] when a held name or the benchmark cannot be
    /// priced, and any scorer or constructor error.
    pub fn run_period_with_snapshot(
        &self,
        index: usize,
        window: ScheduledPeriod,
        snapshot: &UniverseSnapshot,
    ) -> Result<BacktestPeriod> {
        let date = window.rebalance_date;
        snapshot.ensure_point_in_time_for(date)?;

        let outcome = self.scorer.score(snapshot)?;
        debug!(%date, scored = outcome.scores.len(), excluded = outcome.excluded.len(), "Scored universe");
        let portfolio = self.constructor.construct(date, &outcome.scores)?;

        let mut portfolio_return = 0.0;
        for position in portfolio.positions() {
            let series = self.history.price_series(&position.ticker).ok_or_else(|| RondaError::PeriodData {
                date,
                ticker: Some(position.ticker.clone()),
                reason: format!("no price series for {}", position.ticker),
            })?;
            let r = self.holding_return(series, window, Some(&position.ticker))?;
            portfolio_return += position.weight * r;
        }
        let benchmark_return = self.holding_return(self.history.benchmark(), window, None)?;
        let alpha = portfolio_return - benchmark_return;

        let (scores, forward): (Vec<f64>, Vec<f64>) = outcome
            .scores
            .iter()
            .map(|s| {
                let r = self
                    .history
                    .price_series(&s.ticker)
                    .and_then(|series| self.holding_return(series, window, Some(&s.ticker)).ok())
                    .unwrap_or(f64::NAN);
                (s.composite, r)
            })
            .unzip();
        let rank_ic = rank_ic(&scores, &forward);
        let turnover = self.previous.as_ref().map(|prev| portfolio.turnover_from(prev));

        info!(
            period = index,
            %date,
            positions = portfolio.len(),
            portfolio_return,
            benchmark_return,
            alpha,
            "Period complete"
        );

        Ok(BacktestPeriod {
            index,
            rebalance_date: date,
            holding_end: window.holding_end,
            outcome: PeriodOutcome::Completed {
                portfolio,
                portfolio_return,
                benchmark_return,
                alpha,
                turnover,
                rank_ic,
                scored: outcome.scores.len(),
                excluded: outcome.excluded.len(),
            },
        })
    }

    /// Simple return from the rebalancing date to the end of the window.
    fn holding_return(&self, series: &PriceSeries, window: ScheduledPeriod, ticker: Option<&Ticker>) -> Result<f64> {
        let staleness = self.config.max_price_staleness_days;
        let missing = |at: Date| RondaError::PeriodData {
            date: window.rebalance_date,
            ticker: ticker.cloned(),
            reason: format!(
                "no usable {} price within {staleness} days of {at}",
                ticker.map_or("benchmark", Ticker::as_str)
            ),
        };
        let start = series.price_on_or_before(window.rebalance_date, staleness).ok_or_else(|| missing(window.rebalance_date))?;
        let end = series.price_on_or_before(window.holding_end, staleness).ok_or_else(|| missing(window.holding_end))?;
        if !(start.price.is_finite() && start.price > 0.0 && end.price.is_finite() && end.price > 0.0) {
            return Err(RondaError::PeriodData {
                date: window.rebalance_date,
                ticker: ticker.cloned(),
                reason: format!("non-positive price ({} → {})", start.price, end.price),
            });
        }
        Ok(end.price / start.price - 1.0)
    }

    /// Recoverable errors become failed periods, except construction
    /// failures when the run is configured to halt on them.
    const fn records_as_failure(&self, err: &RondaError) -> bool {
        err.is_period_recoverable()
            && !(self.config.halt_on_construction_error && !matches!(err, RondaError::PeriodData { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_traits::{CompositeScore, InstrumentRecord, Position, ScoringOutcome};
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    /// Scores every name by its `score` metric.
    struct MetricScorer;

    impl Scorer for MetricScorer {
        fn name(&self) -> &str {
            "metric"
        }

        fn score(&self, universe: &UniverseSnapshot) -> Result<ScoringOutcome> {
            let mut scores: Vec<CompositeScore> = universe
                .records()
                .iter()
                .filter_map(|r| {
                    r.metric("score").map(|s| CompositeScore {
                        ticker: r.ticker.clone(),
                        sector: r.sector.clone(),
                        composite: s,
                        coverage: 1,
                        factors: vec![],
                    })
                })
                .collect();
            scores.sort_by(|a, b| b.composite.total_cmp(&a.composite));
            Ok(ScoringOutcome { as_of: universe.as_of(), scores, excluded: vec![] })
        }
    }

    /// Holds every scored name at equal weight, and needs at least two.
    struct EqualWeight;

    impl PortfolioConstructor for EqualWeight {
        fn name(&self) -> &str {
            "equal"
        }

        fn construct(&self, as_of: Date, scored: &[CompositeScore]) -> Result<Portfolio> {
            if scored.len() < 2 {
                return Err(RondaError::InsufficientCandidates { date: as_of, available: scored.len(), required: 2 });
            }
            let w = 1.0 / scored.len() as f64;
            let positions = scored
                .iter()
                .map(|s| Position {
                    ticker: s.ticker.clone(),
                    sector: s.sector.clone(),
                    weight: w,
                    composite: s.composite,
                    factors: vec![],
                })
                .collect();
            Ok(Portfolio::new(as_of, positions))
        }
    }

    /// Two names over three quarters of 2023; `B` is unscored in Q2.
    fn history() -> MarketHistory {
        let quarters = [d(2023, 1, 1), d(2023, 4, 1), d(2023, 7, 1), d(2023, 10, 1)];
        let mut records = Vec::new();
        for (i, q) in quarters.iter().enumerate() {
            records.push(InstrumentRecord::new("A", "Tech", *q).with_metric("score", Some(0.9)));
            let b_score = if i == 1 { None } else { Some(0.5) };
            records.push(InstrumentRecord::new("B", "Energy", *q).with_metric("score", b_score));
        }
        let series = |prices: [f64; 4]| PriceSeries::from_pairs(quarters.iter().copied().zip(prices));
        let prices = BTreeMap::from([
            (Ticker::new("A"), series([100.0, 110.0, 121.0, 121.0])),
            (Ticker::new("B"), series([100.0, 90.0, 99.0, 108.9])),
        ]);
        MarketHistory::new(records, prices, series([100.0, 105.0, 105.0, 110.25])).unwrap()
    }

    fn config() -> BacktestConfig {
        BacktestConfig::new(d(2023, 1, 1), d(2023, 10, 1))
    }

    #[test]
    fn test_walk_forward_records_every_period() {
        let history = history();
        let report = WalkForwardEngine::new(&MetricScorer, &EqualWeight, &history, config()).unwrap().run().unwrap();

        assert_eq!(report.periods.len(), 3);
        assert_eq!(report.completed_periods, 2);
        assert_eq!(report.failed_periods, 1);
        assert!(!report.stopped_early);

        // Q1: (0.10 − 0.10) / 2 = 0.0 vs 0.05
        let (p, b) = report.periods[0].returns().unwrap();
        assert_relative_eq!(p, 0.0, epsilon = 1e-12);
        assert_relative_eq!(b, 0.05, epsilon = 1e-12);

        // Q2 fails: only one name scored
        assert!(!report.periods[1].is_completed());

        // Q3: (0.0 + 0.10) / 2 = 0.05 vs 0.05
        assert_relative_eq!(report.periods[2].alpha().unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(report.metrics.periods, 2);
    }

    #[test]
    fn test_halt_on_construction_error() {
        let history = history();
        let config = BacktestConfig { halt_on_construction_error: true, ..config() };
        let err = WalkForwardEngine::new(&MetricScorer, &EqualWeight, &history, config).unwrap().run().unwrap_err();
        assert!(matches!(err, RondaError::InsufficientCandidates { .. }));
    }

    /// Fails every construction with the error built by its function.
    struct Failing(fn(Date) -> RondaError);

    impl PortfolioConstructor for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn construct(&self, as_of: Date, _scored: &[CompositeScore]) -> Result<Portfolio> {
            Err((self.0)(as_of))
        }
    }

    #[rstest]
    #[case::not_converged(|date| RondaError::ConstraintNotConverged { date, iterations: 50, residual: 1e-3 })]
    #[case::invariant(|date| RondaError::InvariantViolation { date, detail: "weights sum to 0.9".into() })]
    #[case::look_ahead(|date| RondaError::LookAhead { as_of: date, ticker: Ticker::new("A"), found: date })]
    #[case::configuration(|_| RondaError::Configuration("bad caps".into()))]
    fn test_defects_abort_the_run(#[case] error: fn(Date) -> RondaError) {
        let history = history();
        let constructor = Failing(error);
        let mut engine = WalkForwardEngine::new(&MetricScorer, &constructor, &history, config()).unwrap();
        let expected = error(d(2023, 1, 1));

        let err = engine.step().unwrap_err();
        assert_eq!(std::mem::discriminant(&err), std::mem::discriminant(&expected));
        assert!(engine.periods().is_empty());

        let err = WalkForwardEngine::new(&MetricScorer, &constructor, &history, config()).unwrap().run().unwrap_err();
        assert_eq!(std::mem::discriminant(&err), std::mem::discriminant(&expected));
    }

    #[rstest]
    #[case::infeasible(|date| RondaError::InfeasibleConstraint { date, reason: "caps".into() }, false)]
    #[case::period_data(|date| RondaError::PeriodData { date, ticker: None, reason: "gap".into() }, true)]
    fn test_halt_flag_only_covers_construction_failures(
        #[case] error: fn(Date) -> RondaError,
        #[case] recorded_when_halting: bool,
    ) {
        let history = history();
        let constructor = Failing(error);

        let report = WalkForwardEngine::new(&MetricScorer, &constructor, &history, config()).unwrap().run().unwrap();
        assert_eq!(report.failed_periods, 3);

        let halting = BacktestConfig { halt_on_construction_error: true, ..config() };
        let result = WalkForwardEngine::new(&MetricScorer, &constructor, &history, halting).unwrap().run();
        assert_eq!(result.is_ok(), recorded_when_halting);
    }

    #[test]
    fn test_missing_price_is_period_data_failure() {
        let quarters = [d(2023, 1, 1), d(2023, 4, 1)];
        let records = vec![
            InstrumentRecord::new("A", "Tech", quarters[0]).with_metric("score", Some(0.9)),
            InstrumentRecord::new("B", "Energy", quarters[0]).with_metric("score", Some(0.5)),
        ];
        let prices =
            BTreeMap::from([(Ticker::new("A"), PriceSeries::from_pairs(quarters.iter().copied().zip([100.0, 110.0])))]);
        let benchmark = PriceSeries::from_pairs(quarters.iter().copied().zip([100.0, 101.0]));
        let history = MarketHistory::new(records, prices, benchmark).unwrap();

        let config = BacktestConfig::new(quarters[0], quarters[1]);
        let report = WalkForwardEngine::new(&MetricScorer, &EqualWeight, &history, config).unwrap().run().unwrap();
        match &report.periods[0].outcome {
            PeriodOutcome::Failed { kind, cause } => {
                assert_eq!(*kind, crate::FailureKind::PeriodData);
                assert!(cause.contains("B"), "{cause}");
            }
            PeriodOutcome::Completed { .. } => panic!("expected a failed period"),
        }
        assert!(report.metrics.cumulative_return.is_nan());
    }

    #[test]
    fn test_stop_handle_halts_after_current_period() {
        let history = history();
        let mut engine = WalkForwardEngine::new(&MetricScorer, &EqualWeight, &history, config()).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);

        assert!(engine.step().unwrap().is_some());
        assert_eq!(engine.state(), EngineState::Running { next_period: 1 });

        engine.stop_handle().stop();
        assert!(engine.step().unwrap().is_none());
        assert_eq!(engine.state(), EngineState::Completed);

        let report = engine.report();
        assert!(report.stopped_early);
        assert_eq!(report.periods.len(), 1);
    }

    #[test]
    fn test_snapshot_with_future_data_is_rejected() {
        let history = history();
        let engine = WalkForwardEngine::new(&MetricScorer, &EqualWeight, &history, config()).unwrap();
        let window = engine.schedule().periods()[0];
        let snapshot = UniverseSnapshot::new(
            window.rebalance_date,
            vec![InstrumentRecord::new("A", "Tech", d(2023, 2, 1)).with_metric("score", Some(0.9))],
        )
        .unwrap();
        let err = engine.run_period_with_snapshot(0, window, &snapshot).unwrap_err();
        assert!(matches!(err, RondaError::LookAhead { .. }));
    }

    #[test]
    fn test_turnover_against_previous_portfolio() {
        let history = history();
        let report = WalkForwardEngine::new(&MetricScorer, &EqualWeight, &history, config()).unwrap().run().unwrap();
        let turnovers: Vec<Option<f64>> = report
            .periods
            .iter()
            .filter_map(|p| match &p.outcome {
                PeriodOutcome::Completed { turnover, .. } => Some(*turnover),
                PeriodOutcome::Failed { .. } => None,
            })
            .collect();
        assert_eq!(turnovers[0], None);
        assert_relative_eq!(turnovers[1].unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_config_validation() {
        assert!(BacktestConfig::new(d(2024, 1, 1), d(2023, 1, 1)).validate().is_err());
        let config = BacktestConfig { max_price_staleness_days: -1, ..config() };
        assert!(config.validate().is_err());
        assert!(self::config().with_holding_period(HoldingPeriod::Months(0)).validate().is_err());
    }
}
