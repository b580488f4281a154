//! Target portfolio types.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::scorer::FactorScore;
use crate::stats::{effective_names, hhi};
use crate::types::{Date, Sector, Ticker};
use crate::Result;

/// One holding of a target portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument identifier.
    pub ticker: Ticker,
    /// Sector label.
    pub sector: Sector,
    /// Target weight (fraction of portfolio value).
    pub weight: f64,
    /// Composite score at construction time.
    pub composite: f64,
    /// Per-factor breakdown at construction time.
    pub factors: Vec<FactorScore>,
}

/// A point-in-time target portfolio.
///
/// Positions keep the order they were selected in (composite descending,
/// ties by ticker). A portfolio is never modified after construction; the
/// next rebalance produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    as_of: Date,
    positions: Vec<Position>,
}

impl Portfolio {
    /// Wrap constructed positions.
    #[must_use]
    pub const fn new(as_of: Date, positions: Vec<Position>) -> Self {
        Self { as_of, positions }
    }

    /// The as-of date the portfolio was built for.
    #[must_use]
    pub const fn as_of(&self) -> Date {
        self.as_of
    }

    /// Holdings in selection order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of holdings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the portfolio holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Tickers in selection order.
    #[must_use]
    pub fn tickers(&self) -> Vec<&Ticker> {
        self.positions.iter().map(|p| &p.ticker).collect()
    }

    /// Weights in selection order.
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.weight).collect()
    }

    /// Weight held in `ticker`, zero if not held.
    #[must_use]
    pub fn weight(&self, ticker: &Ticker) -> f64 {
        self.positions.iter().find(|p| &p.ticker == ticker).map_or(0.0, |p| p.weight)
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }

    /// Summed weight per sector.
    #[must_use]
    pub fn sector_weights(&self) -> BTreeMap<&str, f64> {
        let mut sectors = BTreeMap::new();
        for p in &self.positions {
            *sectors.entry(p.sector.as_str()).or_insert(0.0) += p.weight;
        }
        sectors
    }

    /// Number of distinct sectors held.
    #[must_use]
    pub fn sector_count(&self) -> usize {
        self.positions.iter().map(|p| p.sector.as_str()).collect::<BTreeSet<_>>().len()
    }

    /// Herfindahl-Hirschman concentration index of the weights.
    #[must_use]
    pub fn hhi(&self) -> f64 {
        hhi(&self.weights())
    }

    /// Effective number of names, `1 / HHI`.
    #[must_use]
    pub fn effective_names(&self) -> f64 {
        effective_names(&self.weights())
    }

    /// One-way turnover needed to move from `previous` to this portfolio.
    #[must_use]
    pub fn turnover_from(&self, previous: &Self) -> f64 {
        let mut weights: BTreeMap<&Ticker, (f64, f64)> = BTreeMap::new();
        for p in &previous.positions {
            weights.entry(&p.ticker).or_insert((0.0, 0.0)).0 = p.weight;
        }
        for p in &self.positions {
            weights.entry(&p.ticker).or_insert((0.0, 0.0)).1 = p.weight;
        }
        weights.values().map(|(old, new)| (new - old).abs()).sum::<f64>() / 2.0
    }

    /// Flat one-row-per-position export for tabular collaborators.
    ///
    /// Columns: `ticker`, `sector`, `weight`, `composite`, then one
    /// `<factor>_score` column per factor holding the normalized score.
    ///
    /// # Errors
    ///
    /// Propagates Polars errors from frame assembly.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let factor_names: Vec<&str> = self
            .positions
            .first()
            .map(|p| p.factors.iter().map(|f| f.factor.as_str()).collect())
            .unwrap_or_default();

        let mut columns = vec![
            Column::new(
                "ticker".into(),
                self.positions.iter().map(|p| p.ticker.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "sector".into(),
                self.positions.iter().map(|p| p.sector.as_str()).collect::<Vec<_>>(),
            ),
            Column::new("weight".into(), self.weights()),
            Column::new(
                "composite".into(),
                self.positions.iter().map(|p| p.composite).collect::<Vec<_>>(),
            ),
        ];
        for name in factor_names {
            let values: Vec<Option<f64>> = self
                .positions
                .iter()
                .map(|p| p.factors.iter().find(|f| f.factor == name).and_then(|f| f.normalized))
                .collect();
            columns.push(Column::new(format!("{name}_score").into(), values));
        }

        Ok(DataFrame::new(columns)?)
    }
}
