//! Iterative cap-and-redistribute weight enforcement.
//!
//! Each pass caps individual positions, then caps sectors by scaling them
//! down, and hands the combined excess to the positions still open in
//! proportion to their weight. A capped position or sector stays closed for
//! the rest of the run, so excess never flows back into it. Passes repeat
//! until one changes no weight by more than the tolerance.

use std::collections::{BTreeMap, BTreeSet};

use ronda_traits::{Date, Result, RondaError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constraints::CAP_TOLERANCE;

/// Iteration budget and tolerance for [`water_fill`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterFillConfig {
    /// Maximum number of full passes.
    pub max_passes: usize,
    /// A pass changing no weight by more than this has converged.
    pub tolerance: f64,
}

impl Default for WaterFillConfig {
    fn default() -> Self {
        Self { max_passes: 50, tolerance: 1e-12 }
    }
}

impl WaterFillConfig {
    /// Check the budget and tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] for a zero pass budget or a
    /// negative or non-finite tolerance.
    pub fn validate(&self) -> Result<()> {
        if self.max_passes == 0 {
            return Err(RondaError::Configuration("max_passes must be at least 1".into()));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(RondaError::Configuration(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Caps applied by [`water_fill`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caps {
    /// Cap on any single weight.
    pub position: f64,
    /// Cap on the summed weight of any sector.
    pub sector: f64,
}

/// Add `excess` to the `receivers` in proportion to their current weight.
fn distribute(weights: &mut [f64], receivers: &[usize], excess: f64) -> bool {
    let base: f64 = receivers.iter().map(|&i| weights[i]).sum();
    if receivers.is_empty() || base <= 0.0 {
        return false;
    }
    for &i in receivers {
        weights[i] += excess * weights[i] / base;
    }
    true
}

/// Positions and sectors already held at their cap.
#[derive(Debug)]
struct Closed<'s> {
    positions: Vec<bool>,
    sectors: BTreeSet<&'s str>,
}

impl<'s> Closed<'s> {
    fn new(len: usize) -> Self {
        Self { positions: vec![false; len], sectors: BTreeSet::new() }
    }

    fn open(&self) -> Vec<usize> {
        (0..self.positions.len()).filter(|&i| !self.positions[i]).collect()
    }

    fn cap_positions(&mut self, weights: &mut [f64], cap: f64) -> f64 {
        let mut excess = 0.0;
        for (i, w) in weights.iter_mut().enumerate() {
            if !self.positions[i] && *w > cap {
                excess += *w - cap;
                *w = cap;
                self.positions[i] = true;
            }
        }
        excess
    }

    fn cap_sectors(&mut self, weights: &mut [f64], sectors: &[&'s str], cap: f64) -> f64 {
        let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
        for (w, s) in weights.iter().zip(sectors) {
            *sums.entry(*s).or_insert(0.0) += w;
        }

        let mut excess = 0.0;
        for (sector, sum) in sums {
            if self.sectors.contains(sector) || sum <= cap {
                continue;
            }
            let scale = cap / sum;
            for (i, (w, s)) in weights.iter_mut().zip(sectors).enumerate() {
                if *s == sector {
                    *w *= scale;
                    self.positions[i] = true;
                }
            }
            excess += sum - cap;
            self.sectors.insert(sector);
        }
        excess
    }
}

/// Enforce position and sector caps on `weights` in place.
///
/// `sectors[i]` is the sector of `weights[i]`. Weights must be positive and
/// sum to 1; positions are visited in slice order and sectors in name order,
/// so identical inputs always produce identical weights. Returns the number
/// of passes used.
///
/// # Errors
///
/// Returns [`RondaError::InfeasibleConstraint`] if excess weight has nowhere
/// to go, and [`RondaError::ConstraintNotConverged`] if the pass budget runs
/// out first.
///
/// # Example
///
/// ```
/// use ronda_construct::water_fill::{Caps, WaterFillConfig, water_fill};
/// use ronda_traits::Date;
///
/// let mut weights = vec![0.5, 0.3, 0.2];
/// let sectors = ["Tech", "Energy", "Utilities"];
/// let caps = Caps { position: 0.4, sector: 1.0 };
/// let date = Date::from_ymd_opt(2024, 3, 29).unwrap();
///
/// water_fill(date, &mut weights, &sectors, caps, &WaterFillConfig::default()).unwrap();
/// assert!((weights[0] - 0.4).abs() < 1e-12);
/// assert!((weights[1] - 0.36).abs() < 1e-12);
/// ```
pub fn water_fill(
    as_of: Date,
    weights: &mut [f64],
    sectors: &[&str],
    caps: Caps,
    config: &WaterFillConfig,
) -> Result<usize> {
    if weights.len() != sectors.len() {
        return Err(RondaError::InvalidData(format!(
            "{} weights but {} sector labels",
            weights.len(),
            sectors.len()
        )));
    }

    let mut closed = Closed::new(weights.len());
    let mut residual = f64::INFINITY;
    for pass in 1..=config.max_passes {
        let before = weights.to_vec();

        let excess = closed.cap_positions(weights, caps.position) + closed.cap_sectors(weights, sectors, caps.sector);
        if excess > 0.0 && !distribute(weights, &closed.open(), excess) && excess > CAP_TOLERANCE {
            return Err(RondaError::InfeasibleConstraint {
                date: as_of,
                reason: format!("no position can absorb excess weight {excess:.6}"),
            });
        }

        residual = weights.iter().zip(&before).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max);
        debug!(%as_of, pass, residual, "Water-filling pass");
        if residual <= config.tolerance {
            return Ok(pass);
        }
    }

    Err(RondaError::ConstraintNotConverged { date: as_of, iterations: config.max_passes, residual })
}
