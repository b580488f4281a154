//! Validated factor weight vectors.

use std::collections::BTreeMap;

use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};

use crate::factor::FactorDefinition;

/// Allowed deviation of the weight sum from 1.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Factor name to weight, non-negative and summing to 1.
///
/// Validation happens on construction and on deserialization, so a strategy
/// with a malformed weight vector fails at load time rather than mid-run.
///
/// # Example
///
/// ```
/// use ronda_factors::FactorWeights;
///
/// let weights = FactorWeights::from_pairs([("roe", 0.6), ("debt_to_equity", 0.4)]).unwrap();
/// assert_eq!(weights.get("roe"), 0.6);
/// assert_eq!(weights.get("momentum_12_1"), 0.0);
///
/// assert!(FactorWeights::from_pairs([("roe", 0.6), ("debt_to_equity", 0.6)]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct FactorWeights {
    weights: BTreeMap<String, f64>,
}

impl FactorWeights {
    /// Validate and wrap a weight map.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if the map is empty, a weight is
    /// negative or non-finite, or the weights do not sum to 1 within
    /// [`WEIGHT_SUM_TOLERANCE`].
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(RondaError::Configuration("factor weights must not be empty".into()));
        }
        if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(RondaError::Configuration(format!(
                "factor weight for '{name}' must be finite and non-negative, got {w}"
            )));
        }
        let total: f64 = weights.values().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RondaError::Configuration(format!("factor weights sum to {total}, expected 1")));
        }
        Ok(Self { weights })
    }

    /// Validate and wrap `(name, weight)` pairs.
    ///
    /// # Errors
    ///
    /// See [`FactorWeights::new`].
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Result<Self> {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Equal weight across `names`.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if `names` is empty.
    pub fn equal<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let w = 1.0 / names.len() as f64;
        Self::new(names.into_iter().map(|n| (n, w)).collect())
    }

    /// Weight of `factor`, zero when it has none.
    #[must_use]
    pub fn get(&self, factor: &str) -> f64 {
        self.weights.get(factor).copied().unwrap_or(0.0)
    }

    /// Iterate `(name, weight)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of weighted factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false for a validated vector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Check every weighted name is a configured factor.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] naming the first unknown factor.
    pub fn validate_against(&self, factors: &[FactorDefinition]) -> Result<()> {
        match self.weights.keys().find(|name| !factors.iter().any(|f| &f.name == *name)) {
            Some(name) => Err(RondaError::Configuration(format!("weight given for unknown factor '{name}'"))),
            None => Ok(()),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for FactorWeights {
    type Error = RondaError;

    fn try_from(weights: BTreeMap<String, f64>) -> Result<Self> {
        Self::new(weights)
    }
}

impl From<FactorWeights> for BTreeMap<String, f64> {
    fn from(weights: FactorWeights) -> Self {
        weights.weights
    }
}
