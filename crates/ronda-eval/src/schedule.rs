//! Rebalancing calendars.

use chrono::{Datelike, Days, Months};
use ronda_traits::{Date, Result, RondaError};
use serde::{Deserialize, Serialize};

/// Length of one holding period.
///
/// Calendar-month periods start on the first of a month; quarters start on
/// the first of January, April, July and October. Day-count periods start on
/// the backtest start date itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingPeriod {
    /// Calendar quarter.
    #[default]
    Quarter,
    /// `n` calendar months from the first of a month.
    Months(u32),
    /// `n` days.
    Days(u64),
}

impl HoldingPeriod {
    /// Number of periods in a year, for annualizing per-period statistics.
    #[must_use]
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Self::Quarter => 4.0,
            Self::Months(n) => 12.0 / f64::from(*n),
            Self::Days(n) => 365.25 / *n as f64,
        }
    }

    /// Check the period length is positive.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] for a zero-length period.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Months(0) | Self::Days(0) => {
                Err(RondaError::Configuration(format!("holding period must be positive, got {self:?}")))
            }
            _ => Ok(()),
        }
    }

    /// The first period start on or after `date`.
    fn align(&self, date: Date) -> Option<Date> {
        let step = match self {
            Self::Days(_) => return Some(date),
            Self::Quarter => 3,
            Self::Months(_) => 1,
        };
        let month0 = date.month0();
        let aligned_month0 = month0 - month0 % step;
        let first = Date::from_ymd_opt(date.year(), aligned_month0 + 1, 1)?;
        if first == date { Some(first) } else { first.checked_add_months(Months::new(step)) }
    }

    /// The start of the period following the one starting at `date`.
    fn advance(&self, date: Date) -> Option<Date> {
        match self {
            Self::Quarter => date.checked_add_months(Months::new(3)),
            Self::Months(n) => date.checked_add_months(Months::new(*n)),
            Self::Days(n) => date.checked_add_days(Days::new(*n)),
        }
    }
}

/// One scheduled holding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPeriod {
    /// Date the portfolio is built on.
    pub rebalance_date: Date,
    /// Date the portfolio is marked and replaced.
    pub holding_end: Date,
}

/// Consecutive, non-overlapping holding windows inside a date range.
///
/// # Example
///
/// ```
/// use ronda_eval::{HoldingPeriod, RebalanceSchedule};
/// use ronda_traits::Date;
///
/// let d = |y, m, day| Date::from_ymd_opt(y, m, day).unwrap();
/// let schedule = RebalanceSchedule::new(d(2023, 2, 15), d(2024, 1, 1), HoldingPeriod::Quarter).unwrap();
///
/// let starts: Vec<Date> = schedule.periods().iter().map(|p| p.rebalance_date).collect();
/// assert_eq!(starts, vec![d(2023, 4, 1), d(2023, 7, 1), d(2023, 10, 1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceSchedule {
    start: Date,
    end: Date,
    holding_period: HoldingPeriod,
    periods: Vec<ScheduledPeriod>,
}

impl RebalanceSchedule {
    /// Enumerate the windows from the first aligned date on or after `start`;
    /// a window is kept only if it ends on or before `end`.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if `start` is after `end` or the
    /// holding period is invalid.
    pub fn new(start: Date, end: Date, holding_period: HoldingPeriod) -> Result<Self> {
        holding_period.validate()?;
        if start > end {
            return Err(RondaError::Configuration(format!("backtest start {start} is after end {end}")));
        }

        let mut periods = Vec::new();
        let mut current = holding_period.align(start);
        while let Some(rebalance_date) = current {
            let Some(holding_end) = holding_period.advance(rebalance_date).filter(|d| *d <= end) else {
                break;
            };
            periods.push(ScheduledPeriod { rebalance_date, holding_end });
            current = Some(holding_end);
        }

        Ok(Self { start, end, holding_period, periods })
    }

    /// Requested start date.
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Requested end date.
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Holding period length.
    #[must_use]
    pub const fn holding_period(&self) -> HoldingPeriod {
        self.holding_period
    }

    /// Scheduled windows in chronological order.
    #[must_use]
    pub fn periods(&self) -> &[ScheduledPeriod] {
        &self.periods
    }

    /// Number of windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether the range holds no complete window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}
