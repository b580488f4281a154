//! Synthetic universes shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::Months;
use ronda::prelude::*;

pub const SECTORS: [&str; 5] = ["Technology", "Energy", "Healthcare", "Financials", "Utilities"];

pub fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd_opt(y, m, day).unwrap()
}

/// Instrument `i` on quarter `q`, with metrics that shift from quarter to quarter.
pub fn record(i: usize, q: usize, as_of: Date) -> InstrumentRecord {
    let roe = ((i * 37 + q * 5) % 30) as f64 / 100.0;
    let earnings_yield = ((i * 7 + q * 3) % 30) as f64 / 200.0;
    let debt_to_equity = ((i * 13) % 20) as f64 / 10.0;
    InstrumentRecord::new(format!("T{i:02}"), SECTORS[i % SECTORS.len()], as_of)
        .with_market_cap(1.0e9 * (i + 1) as f64)
        .with_metric("roe", Some(roe))
        .with_metric("earnings_yield", if i % 11 == 4 { None } else { Some(earnings_yield) })
        .with_metric("debt_to_equity", Some(debt_to_equity))
}

pub fn universe(n: usize, as_of: Date) -> Vec<InstrumentRecord> {
    (0..n).map(|i| record(i, 0, as_of)).collect()
}

/// ROE, earnings yield and leverage, with names above 1.8× debt-to-equity excluded.
pub fn strategy() -> StrategyConfig {
    let factors = vec![
        FactorDefinition::metric("roe"),
        FactorDefinition::metric("earnings_yield"),
        FactorDefinition::metric("debt_to_equity").as_risk(),
    ];
    let weights = FactorWeights::from_pairs([("roe", 0.4), ("earnings_yield", 0.3), ("debt_to_equity", 0.3)]).unwrap();
    let mut config = StrategyConfig::new(factors, weights);
    config.filters = HardFilterSet::new().max_metric("debt_to_equity", 1.8);
    config.validate().unwrap();
    config
}

/// Quarter-start dates from `start`, `count` of them.
pub fn quarters(start: Date, count: usize) -> Vec<Date> {
    (0..count).map(|k| start.checked_add_months(Months::new(3 * k as u32)).unwrap()).collect()
}

/// `n` names with a record and a price on every quarter start, and a benchmark
/// growing 1% a quarter.
pub fn history(n: usize, dates: &[Date]) -> MarketHistory {
    let mut records = Vec::new();
    let mut prices = BTreeMap::new();
    for i in 0..n {
        let mut price = 50.0 + i as f64;
        let mut points = Vec::with_capacity(dates.len());
        for (q, date) in dates.iter().enumerate() {
            records.push(record(i, q, *date));
            points.push((*date, price));
            let r = ((i * 7 + q * 3) % 11) as f64 - 5.0;
            price *= 1.0 + r / 100.0;
        }
        prices.insert(Ticker::new(format!("T{i:02}")), PriceSeries::from_pairs(points));
    }
    let benchmark = PriceSeries::from_pairs(dates.iter().enumerate().map(|(q, d)| (*d, 100.0 * 1.01_f64.powi(q as i32))));
    MarketHistory::new(records, prices, benchmark).unwrap()
}
