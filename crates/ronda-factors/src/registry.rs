//! Factor registry for discovering and categorizing built-in factors.
//!
//! The registry is metadata only. [`crate::FactorDefinition::from_registry`]
//! turns an entry into a definition a scorer can evaluate.

use serde::{Deserialize, Serialize};

/// Factor category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactorCategory {
    /// Price momentum factors
    Momentum,
    /// Valuation factors
    Value,
    /// Profitability and quality factors
    Quality,
    /// Growth factors
    Growth,
    /// Balance-sheet and price risk factors (lower is better)
    Risk,
    /// Size and tradability factors
    Liquidity,
}

impl FactorCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Momentum => "Price momentum and trend-following factors",
            Self::Value => "Valuation metrics comparing fundamentals to price",
            Self::Quality => "Profitability and operational efficiency metrics",
            Self::Growth => "Revenue and earnings growth factors",
            Self::Risk => "Leverage and volatility measures where lower values rank higher",
            Self::Liquidity => "Size and trading volume measures",
        }
    }
}

/// How a built-in factor obtains its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorKind {
    /// Read a fundamental metric of the same name.
    Fundamental,
    /// Trailing return over `lookback` observations, skipping the latest `skip`.
    Momentum {
        /// Observations to look back.
        lookback: usize,
        /// Most recent observations to skip.
        skip: usize,
    },
    /// Sample standard deviation of the last `window` simple returns.
    Volatility {
        /// Number of returns in the window.
        window: usize,
    },
}

/// Metadata about a factor.
#[derive(Debug, Clone, Serialize)]
pub struct FactorInfo {
    /// Unique identifier for the factor
    pub name: &'static str,

    /// Category classification
    pub category: FactorCategory,

    /// Human-readable description
    pub description: &'static str,

    /// Where the raw value comes from
    pub kind: FactorKind,

    /// Whether lower raw values are better by default
    pub is_risk: bool,
}

impl FactorInfo {
    /// Whether the factor reads a fundamental metric rather than prices.
    #[must_use]
    pub const fn requires_fundamentals(&self) -> bool {
        matches!(self.kind, FactorKind::Fundamental)
    }
}

/// Get information about all built-in factors.
#[must_use]
pub fn available_factors() -> Vec<FactorInfo> {
    vec![
        // Momentum
        FactorInfo {
            name: "momentum_12_1",
            category: FactorCategory::Momentum,
            description: "12-month price return skipping the most recent month",
            kind: FactorKind::Momentum { lookback: 252, skip: 21 },
            is_risk: false,
        },
        FactorInfo {
            name: "momentum_6m",
            category: FactorCategory::Momentum,
            description: "6-month price return",
            kind: FactorKind::Momentum { lookback: 126, skip: 0 },
            is_risk: false,
        },
        // Value
        FactorInfo {
            name: "earnings_yield",
            category: FactorCategory::Value,
            description: "Earnings relative to market cap (inverse P/E)",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        FactorInfo {
            name: "fcf_yield",
            category: FactorCategory::Value,
            description: "Free cash flow relative to market cap",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        FactorInfo {
            name: "book_to_price",
            category: FactorCategory::Value,
            description: "Book value of equity relative to market cap",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        // Quality
        FactorInfo {
            name: "roe",
            category: FactorCategory::Quality,
            description: "Net income relative to shareholder equity",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        FactorInfo {
            name: "roic",
            category: FactorCategory::Quality,
            description: "Operating profit relative to invested capital",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        FactorInfo {
            name: "gross_margin",
            category: FactorCategory::Quality,
            description: "Gross profit relative to revenue",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        FactorInfo {
            name: "interest_coverage",
            category: FactorCategory::Quality,
            description: "Operating income relative to interest expense",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        // Growth
        FactorInfo {
            name: "revenue_growth",
            category: FactorCategory::Growth,
            description: "Year-over-year revenue growth",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        FactorInfo {
            name: "eps_growth",
            category: FactorCategory::Growth,
            description: "Year-over-year earnings per share growth",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
        // Risk
        FactorInfo {
            name: "debt_to_equity",
            category: FactorCategory::Risk,
            description: "Total debt relative to shareholder equity",
            kind: FactorKind::Fundamental,
            is_risk: true,
        },
        FactorInfo {
            name: "volatility_3m",
            category: FactorCategory::Risk,
            description: "Realized volatility of the last 63 daily returns",
            kind: FactorKind::Volatility { window: 63 },
            is_risk: true,
        },
        // Liquidity
        FactorInfo {
            name: "dollar_volume",
            category: FactorCategory::Liquidity,
            description: "Average daily traded dollar volume",
            kind: FactorKind::Fundamental,
            is_risk: false,
        },
    ]
}

/// Get all factors in a specific category.
#[must_use]
pub fn factors_by_category(category: FactorCategory) -> Vec<FactorInfo> {
    available_factors().into_iter().filter(|info| info.category == category).collect()
}

/// Get information about a specific factor by name.
#[must_use]
pub fn get_factor_info(name: &str) -> Option<FactorInfo> {
    available_factors().into_iter().find(|info| info.name == name)
}

/// Get all categories that have at least one built-in factor.
#[must_use]
pub fn available_categories() -> Vec<FactorCategory> {
    let mut categories: Vec<_> = available_factors().into_iter().map(|info| info.category).collect();
    categories.sort();
    categories.dedup();
    categories
}
