//! Universe snapshots and point-in-time market history.
//!
//! A [`UniverseSnapshot`] is the scorer's entire view of the world for one
//! evaluation date. A [`MarketHistory`] holds records and prices for many
//! dates and is the only place a snapshot for a historical date is cut from,
//! so every field the scorer sees is dated on or before the as-of date.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{Date, InstrumentRecord, PriceSeries, Sector, Ticker};
use crate::{Result, RondaError};

/// The input record set for one evaluation date, one record per ticker.
///
/// Records are held sorted by ticker so iteration order never depends on the
/// order the feed delivered them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    as_of: Date,
    records: Vec<InstrumentRecord>,
}

impl UniverseSnapshot {
    /// Build a snapshot for `as_of` from one record per ticker.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] if a record is malformed or a ticker
    /// appears twice.
    pub fn new(as_of: Date, mut records: Vec<InstrumentRecord>) -> Result<Self> {
        for record in &records {
            record.validate()?;
        }
        records.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        if let Some(pair) = records.windows(2).find(|w| w[0].ticker == w[1].ticker) {
            return Err(RondaError::InvalidData(format!(
                "duplicate record for {} in universe as of {as_of}",
                pair[0].ticker
            )));
        }
        Ok(Self { as_of, records })
    }

    /// The evaluation date.
    #[must_use]
    pub const fn as_of(&self) -> Date {
        self.as_of
    }

    /// Records sorted by ticker.
    #[must_use]
    pub fn records(&self) -> &[InstrumentRecord] {
        &self.records
    }

    /// Number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no instruments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by ticker.
    #[must_use]
    pub fn get(&self, ticker: &Ticker) -> Option<&InstrumentRecord> {
        self.records
            .binary_search_by(|r| r.ticker.cmp(ticker))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Distinct sectors present.
    #[must_use]
    pub fn sectors(&self) -> BTreeSet<&Sector> {
        self.records.iter().map(|r| &r.sector).collect()
    }

    /// Verify that nothing in the snapshot is dated after its as-of date.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::LookAhead`] naming the first offending ticker.
    pub fn ensure_point_in_time(&self) -> Result<()> {
        self.ensure_point_in_time_for(self.as_of)
    }

    /// Verify that nothing in the snapshot is dated after `date`.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::LookAhead`] naming the first offending ticker, or
    /// when the snapshot's own as-of date is later than `date`.
    pub fn ensure_point_in_time_for(&self, date: Date) -> Result<()> {
        for record in &self.records {
            let latest = record.latest_data_date().max(self.as_of);
            if latest > date {
                return Err(RondaError::LookAhead {
                    as_of: date,
                    ticker: record.ticker.clone(),
                    found: latest,
                });
            }
        }
        Ok(())
    }
}

/// Records and prices spanning many dates, from which point-in-time
/// snapshots are cut.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use ronda_traits::{Date, InstrumentRecord, MarketHistory, PriceSeries};
///
/// let d = |m, day| Date::from_ymd_opt(2024, m, day).unwrap();
/// let records = vec![
///     InstrumentRecord::new("AAPL", "Technology", d(1, 2)).with_metric("roe", Some(1.4)),
///     InstrumentRecord::new("AAPL", "Technology", d(4, 1)).with_metric("roe", Some(1.6)),
/// ];
/// let history = MarketHistory::new(records, BTreeMap::new(), PriceSeries::default()).unwrap();
///
/// let snapshot = history.as_of(d(3, 31), 120).unwrap();
/// assert_eq!(snapshot.records()[0].metric("roe"), Some(1.4));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MarketHistory {
    records: BTreeMap<Ticker, Vec<InstrumentRecord>>,
    prices: BTreeMap<Ticker, PriceSeries>,
    benchmark: PriceSeries,
}

impl MarketHistory {
    /// Assemble a history from records of any date, per-ticker price series
    /// and the benchmark series.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] if a record is malformed or a ticker
    /// has two records for the same date.
    pub fn new(
        records: Vec<InstrumentRecord>,
        prices: BTreeMap<Ticker, PriceSeries>,
        benchmark: PriceSeries,
    ) -> Result<Self> {
        let mut by_ticker: BTreeMap<Ticker, Vec<InstrumentRecord>> = BTreeMap::new();
        for record in records {
            record.validate()?;
            by_ticker.entry(record.ticker.clone()).or_default().push(record);
        }
        for (ticker, list) in &mut by_ticker {
            list.sort_by_key(|r| r.as_of);
            if let Some(pair) = list.windows(2).find(|w| w[0].as_of == w[1].as_of) {
                return Err(RondaError::InvalidData(format!(
                    "duplicate record for {ticker} dated {}",
                    pair[0].as_of
                )));
            }
        }
        Ok(Self { records: by_ticker, prices, benchmark })
    }

    /// Cut the universe as it was known on `date`.
    ///
    /// Per ticker, the latest record dated on or before `date` is used,
    /// provided it is at most `max_record_age_days` old. Its trailing price
    /// history (the record's own, or else the history's price series for that
    /// ticker) is truncated to observations dated on or before `date`.
    /// Anything dated after `date` is ignored, not merely left unused.
    ///
    /// # Errors
    ///
    /// Propagates [`UniverseSnapshot::new`] validation errors.
    pub fn as_of(&self, date: Date, max_record_age_days: i64) -> Result<UniverseSnapshot> {
        let mut selected = Vec::with_capacity(self.records.len());
        for (ticker, list) in &self.records {
            let end = list.partition_point(|r| r.as_of <= date);
            let Some(record) = list[..end].last() else {
                continue;
            };
            if (date - record.as_of).num_days() > max_record_age_days {
                continue;
            }
            let history = record
                .price_history
                .as_ref()
                .or_else(|| self.prices.get(ticker))
                .map(|h| h.truncated(date));
            let mut record = record.clone();
            record.price_history = history;
            selected.push(record);
        }
        UniverseSnapshot::new(date, selected)
    }

    /// Price series of one instrument, if any.
    #[must_use]
    pub fn price_series(&self, ticker: &Ticker) -> Option<&PriceSeries> {
        self.prices.get(ticker)
    }

    /// The benchmark price series.
    #[must_use]
    pub const fn benchmark(&self) -> &PriceSeries {
        &self.benchmark
    }

    /// Number of distinct tickers with at least one record.
    #[must_use]
    pub fn ticker_count(&self) -> usize {
        self.records.len()
    }

    /// Date of the oldest record.
    #[must_use]
    pub fn first_record_date(&self) -> Option<Date> {
        self.records.values().filter_map(|l| l.first().map(|r| r.as_of)).min()
    }

    /// Date of the most recent record.
    #[must_use]
    pub fn last_record_date(&self) -> Option<Date> {
        self.records.values().filter_map(|l| l.last().map(|r| r.as_of)).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> Date {
        Date::from_ymd_opt(2024, m, day).unwrap()
    }

    fn history() -> MarketHistory {
        let records = vec![
            InstrumentRecord::new("AAPL", "Technology", d(1, 2)).with_metric("roe", Some(1.4)),
            InstrumentRecord::new("AAPL", "Technology", d(4, 1)).with_metric("roe", Some(1.6)),
            InstrumentRecord::new("XOM", "Energy", d(1, 2)).with_metric("roe", Some(0.2)),
            InstrumentRecord::new("NEW", "Energy", d(5, 1)).with_metric("roe", Some(0.3)),
        ];
        let mut prices = BTreeMap::new();
        prices.insert(
            Ticker::new("AAPL"),
            PriceSeries::from_pairs([(d(3, 28), 170.0), (d(4, 1), 171.0), (d(4, 2), 172.0)]),
        );
        MarketHistory::new(records, prices, PriceSeries::default()).unwrap()
    }

    #[test]
    fn test_snapshot_sorted_by_ticker() {
        let snapshot = UniverseSnapshot::new(
            d(1, 2),
            vec![
                InstrumentRecord::new("XOM", "Energy", d(1, 2)),
                InstrumentRecord::new("AAPL", "Technology", d(1, 2)),
            ],
        )
        .unwrap();
        assert_eq!(snapshot.records()[0].ticker.as_str(), "AAPL");
        assert!(snapshot.get(&Ticker::new("XOM")).is_some());
        assert!(snapshot.get(&Ticker::new("MSFT")).is_none());
        assert_eq!(snapshot.sectors().len(), 2);
    }

    #[test]
    fn test_snapshot_rejects_duplicates() {
        let result = UniverseSnapshot::new(
            d(1, 2),
            vec![
                InstrumentRecord::new("XOM", "Energy", d(1, 2)),
                InstrumentRecord::new("XOM", "Energy", d(1, 2)),
            ],
        );
        assert!(matches!(result, Err(RondaError::InvalidData(_))));
    }

    #[test]
    fn test_as_of_picks_latest_record_not_after_date() {
        let snapshot = history().as_of(d(3, 31), 120).unwrap();
        let aapl = snapshot.get(&Ticker::new("AAPL")).unwrap();
        assert_eq!(aapl.metric("roe"), Some(1.4));
        assert!(snapshot.get(&Ticker::new("NEW")).is_none());
        snapshot.ensure_point_in_time().unwrap();
    }

    #[test]
    fn test_as_of_truncates_price_history() {
        let snapshot = history().as_of(d(4, 1), 120).unwrap();
        let aapl = snapshot.get(&Ticker::new("AAPL")).unwrap();
        assert_eq!(aapl.metric("roe"), Some(1.6));
        assert_eq!(aapl.price_history_len(), 2);
        snapshot.ensure_point_in_time().unwrap();
    }

    #[test]
    fn test_as_of_drops_stale_records() {
        let snapshot = history().as_of(d(6, 30), 60).unwrap();
        assert!(snapshot.get(&Ticker::new("XOM")).is_none());
        assert!(snapshot.get(&Ticker::new("NEW")).is_some());
    }

    #[test]
    fn test_ensure_point_in_time_rejects_future_data() {
        let snapshot = UniverseSnapshot::new(
            d(3, 31),
            vec![InstrumentRecord::new("AAPL", "Technology", d(4, 1))],
        )
        .unwrap();
        let err = snapshot.ensure_point_in_time().unwrap_err();
        assert!(matches!(err, RondaError::LookAhead { found, .. } if found == d(4, 1)));

        let snapshot = UniverseSnapshot::new(
            d(3, 31),
            vec![
                InstrumentRecord::new("AAPL", "Technology", d(3, 1))
                    .with_price_history(PriceSeries::from_pairs([(d(4, 2), 100.0)])),
            ],
        )
        .unwrap();
        assert!(snapshot.ensure_point_in_time().is_err());
        assert!(snapshot.ensure_point_in_time_for(d(4, 2)).is_ok());
    }

    #[test]
    fn test_history_date_range() {
        let history = history();
        assert_eq!(history.ticker_count(), 3);
        assert_eq!(history.first_record_date(), Some(d(1, 2)));
        assert_eq!(history.last_record_date(), Some(d(5, 1)));
    }
}
