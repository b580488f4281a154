//! Common types used throughout the ronda framework.
//!
//! This module defines the point-in-time instrument record, the price series
//! attached to it and the identifiers used to key both.

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Result, RondaError};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Sector label attached to an instrument.
pub type Sector = String;

/// Equity ticker identifier.
///
/// Tickers order lexically, which is the tie-break used wherever ranking
/// needs to be deterministic.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ticker(pub String);

impl Ticker {
    /// Create a new ticker.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A dated price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observation date.
    pub date: Date,
    /// Close (or adjusted close) price.
    pub price: f64,
}

impl PricePoint {
    /// Create a new price point.
    #[must_use]
    pub const fn new(date: Date, price: f64) -> Self {
        Self { date, price }
    }
}

/// Chronologically ordered price observations for one instrument.
///
/// The series is sorted by date on construction; when two observations share
/// a date the later one in the input wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from unordered observations.
    #[must_use]
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    /// Build a series from `(date, price)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Date, f64)>) -> Self {
        Self::new(pairs.into_iter().map(|(date, price)| PricePoint::new(date, price)).collect())
    }

    /// The observations, oldest first.
    #[must_use]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Date of the oldest observation.
    #[must_use]
    pub fn first_date(&self) -> Option<Date> {
        self.points.first().map(|p| p.date)
    }

    /// Date of the most recent observation.
    #[must_use]
    pub fn last_date(&self) -> Option<Date> {
        self.points.last().map(|p| p.date)
    }

    /// A copy holding only observations dated on or before `as_of`.
    #[must_use]
    pub fn truncated(&self, as_of: Date) -> Self {
        let end = self.points.partition_point(|p| p.date <= as_of);
        Self { points: self.points[..end].to_vec() }
    }

    /// The most recent observation on or before `date`, provided it is at most
    /// `max_staleness_days` old.
    #[must_use]
    pub fn price_on_or_before(&self, date: Date, max_staleness_days: i64) -> Option<PricePoint> {
        let end = self.points.partition_point(|p| p.date <= date);
        let point = *self.points[..end].last()?;
        ((date - point.date).num_days() <= max_staleness_days).then_some(point)
    }

    /// Prices in chronological order.
    #[must_use]
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Simple returns between consecutive observations.
    #[must_use]
    pub fn returns(&self) -> Vec<f64> {
        self.points.windows(2).map(|w| w[1].price / w[0].price - 1.0).collect()
    }
}

/// One instrument's captured data for a single evaluation date.
///
/// Produced by the ingestion collaborator and never mutated afterwards.
/// Fundamental metrics may be missing (`None`); non-finite values are treated
/// as missing by [`InstrumentRecord::metric`].
///
/// # Example
///
/// ```
/// use ronda_traits::{Date, InstrumentRecord};
///
/// let record = InstrumentRecord::new("AAPL", "Technology", Date::from_ymd_opt(2024, 1, 2).unwrap())
///     .with_market_cap(3.0e12)
///     .with_metric("roe", Some(1.47))
///     .with_metric("debt_to_equity", None);
///
/// assert_eq!(record.metric("roe"), Some(1.47));
/// assert_eq!(record.metric("debt_to_equity"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    /// Ticker identifier.
    pub ticker: Ticker,
    /// Sector label.
    pub sector: Sector,
    /// Date the record was captured; every field is known as of this date.
    pub as_of: Date,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Average daily dollar volume.
    pub avg_dollar_volume: Option<f64>,
    /// Fundamental metric name to value.
    pub metrics: BTreeMap<String, Option<f64>>,
    /// Trailing price history, when the feed supplies one.
    pub price_history: Option<PriceSeries>,
}

impl InstrumentRecord {
    /// Create a record with no metrics attached.
    #[must_use]
    pub fn new(ticker: impl Into<Ticker>, sector: impl Into<Sector>, as_of: Date) -> Self {
        Self {
            ticker: ticker.into(),
            sector: sector.into(),
            as_of,
            market_cap: None,
            avg_dollar_volume: None,
            metrics: BTreeMap::new(),
            price_history: None,
        }
    }

    /// Attach a fundamental metric.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Attach the market capitalization.
    #[must_use]
    pub const fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    /// Attach the average daily dollar volume.
    #[must_use]
    pub const fn with_dollar_volume(mut self, volume: f64) -> Self {
        self.avg_dollar_volume = Some(volume);
        self
    }

    /// Attach a trailing price history.
    #[must_use]
    pub fn with_price_history(mut self, history: PriceSeries) -> Self {
        self.price_history = Some(history);
        self
    }

    /// The value of a fundamental metric, if present and finite.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied().flatten().filter(|v| v.is_finite())
    }

    /// Number of trailing price observations available.
    #[must_use]
    pub fn price_history_len(&self) -> usize {
        self.price_history.as_ref().map_or(0, PriceSeries::len)
    }

    /// The latest date any field of this record refers to.
    #[must_use]
    pub fn latest_data_date(&self) -> Date {
        self.price_history
            .as_ref()
            .and_then(PriceSeries::last_date)
            .map_or(self.as_of, |d| d.max(self.as_of))
    }

    /// Check the record for malformed values.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] for an empty ticker or sector, a
    /// negative or non-finite market cap or dollar volume, or a non-positive
    /// price in the trailing history.
    pub fn validate(&self) -> Result<()> {
        if self.ticker.as_str().trim().is_empty() {
            return Err(RondaError::InvalidData(format!("record dated {} has an empty ticker", self.as_of)));
        }
        if self.sector.trim().is_empty() {
            return Err(RondaError::InvalidData(format!("{} has an empty sector label", self.ticker)));
        }
        for (field, value) in [("market_cap", self.market_cap), ("avg_dollar_volume", self.avg_dollar_volume)] {
            if let Some(v) = value
                && (!v.is_finite() || v < 0.0)
            {
                return Err(RondaError::InvalidData(format!("{} has invalid {field}: {v}", self.ticker)));
            }
        }
        if let Some(bad) = self
            .price_history
            .as_ref()
            .and_then(|h| h.points().iter().find(|p| !(p.price.is_finite() && p.price > 0.0)))
        {
            return Err(RondaError::InvalidData(format!(
                "{} has invalid price {} on {}",
                self.ticker, bad.price, bad.date
            )));
        }
        Ok(())
    }
}
