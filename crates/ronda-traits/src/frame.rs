//! Conversion between universe snapshots and Polars DataFrames.
//!
//! Tabular collaborators hand over one row per instrument. The expected
//! schema is:
//! - `ticker`: instrument identifier (string, required)
//! - `sector`: sector label (string, required)
//! - `market_cap`, `avg_dollar_volume`: numeric, optional
//! - any other numeric column: a fundamental metric, nulls allowed

use polars::prelude::*;

use crate::types::{Date, InstrumentRecord};
use crate::universe::UniverseSnapshot;
use crate::{Result, RondaError};

/// Columns with a fixed meaning; every other numeric column is a metric.
const RESERVED_COLUMNS: [&str; 4] = ["ticker", "sector", "market_cap", "avg_dollar_volume"];

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::UInt64
            | DataType::UInt32
    )
}

fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let series = df.column(name)?.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.clone())
}

fn string_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let column = df.column(name).map_err(|_| RondaError::MissingColumn(name.to_string()))?;
    Ok(column.as_materialized_series().str()?.clone())
}

impl UniverseSnapshot {
    /// Build a snapshot from a one-row-per-instrument DataFrame.
    ///
    /// Every record is stamped with `as_of`. Trailing price history cannot be
    /// carried in this layout; attach it through [`crate::MarketHistory`].
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::MissingColumn`] if `ticker` or `sector` is absent,
    /// [`RondaError::InvalidData`] for null identifiers, and propagates
    /// Polars and record validation errors.
    ///
    /// # Example
    ///
    /// ```
    /// use polars::prelude::*;
    /// use ronda_traits::{Date, UniverseSnapshot};
    ///
    /// let df = df! {
    ///     "ticker" => &["AAPL", "XOM"],
    ///     "sector" => &["Technology", "Energy"],
    ///     "roe" => &[Some(1.47), None],
    /// }
    /// .unwrap();
    ///
    /// let snapshot = UniverseSnapshot::from_frame(Date::from_ymd_opt(2024, 1, 2).unwrap(), &df).unwrap();
    /// assert_eq!(snapshot.len(), 2);
    /// ```
    pub fn from_frame(as_of: Date, df: &DataFrame) -> Result<Self> {
        let tickers = string_column(df, "ticker")?;
        let sectors = string_column(df, "sector")?;

        let has = |name: &str| df.get_column_names().iter().any(|c| c.as_str() == name);
        let market_caps = if has("market_cap") { Some(float_column(df, "market_cap")?) } else { None };
        let volumes =
            if has("avg_dollar_volume") { Some(float_column(df, "avg_dollar_volume")?) } else { None };

        let mut metrics: Vec<(String, Float64Chunked)> = Vec::new();
        for column in df.get_columns() {
            let name = column.name().as_str();
            if RESERVED_COLUMNS.contains(&name) || !is_numeric(column.dtype()) {
                continue;
            }
            metrics.push((name.to_string(), float_column(df, name)?));
        }

        let mut records = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let ticker = tickers
                .get(row)
                .ok_or_else(|| RondaError::InvalidData(format!("null ticker in row {row}")))?;
            let sector = sectors
                .get(row)
                .ok_or_else(|| RondaError::InvalidData(format!("null sector for {ticker}")))?;

            let mut record = InstrumentRecord::new(ticker, sector, as_of);
            record.market_cap = market_caps.as_ref().and_then(|c| c.get(row));
            record.avg_dollar_volume = volumes.as_ref().and_then(|c| c.get(row));
            for (name, values) in &metrics {
                record.metrics.insert(name.clone(), values.get(row));
            }
            records.push(record);
        }

        Self::new(as_of, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> Date {
        Date::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn test_from_frame_reads_metrics_and_reserved_columns() {
        let df = df! {
            "ticker" => &["XOM", "AAPL"],
            "sector" => &["Energy", "Technology"],
            "market_cap" => &[4.0e11, 3.0e12],
            "roe" => &[Some(0.2), None],
            "interest_coverage" => &[30i64, 25i64],
            "note" => &["a", "b"],
        }
        .unwrap();

        let snapshot = UniverseSnapshot::from_frame(date(), &df).unwrap();
        assert_eq!(snapshot.len(), 2);

        let aapl = &snapshot.records()[0];
        assert_eq!(aapl.ticker.as_str(), "AAPL");
        assert_eq!(aapl.market_cap, Some(3.0e12));
        assert_eq!(aapl.avg_dollar_volume, None);
        assert_eq!(aapl.metric("roe"), None);
        assert_eq!(aapl.metric("interest_coverage"), Some(25.0));
        assert!(!aapl.metrics.contains_key("note"));
        assert!(!aapl.metrics.contains_key("market_cap"));

        let xom = &snapshot.records()[1];
        assert_eq!(xom.metric("roe"), Some(0.2));
        assert_eq!(xom.as_of, date());
    }

    #[test]
    fn test_from_frame_requires_sector() {
        let df = df! {
            "ticker" => &["XOM"],
            "roe" => &[0.2],
        }
        .unwrap();

        let err = UniverseSnapshot::from_frame(date(), &df).unwrap_err();
        assert!(matches!(err, RondaError::MissingColumn(c) if c == "sector"));
    }
}
