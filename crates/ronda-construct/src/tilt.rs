//! Score-tilted initial weights.

use ndarray::Array1;
use ronda_traits::stats::standardize_array;
use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};

/// Configuration for the score tilt applied on top of equal weight.
///
/// Each selected name starts at `1/N`, scaled by
/// `1 + tilt_factor × z` where `z` is its standardized composite score. The
/// multiplier is clipped to `[1 − tilt_range, 1 + tilt_range]` before the
/// weights are renormalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    /// Weight multiplier change per standard deviation of score.
    pub tilt_factor: f64,
    /// Maximum relative deviation from equal weight.
    pub tilt_range: f64,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self { tilt_factor: 0.2, tilt_range: 0.2 }
    }
}

impl TiltConfig {
    /// Plain equal weighting.
    #[must_use]
    pub const fn equal_weight() -> Self {
        Self { tilt_factor: 0.0, tilt_range: 0.0 }
    }

    /// Check the tilt parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Configuration`] if `tilt_factor` is negative or
    /// non-finite, or `tilt_range` lies outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if !self.tilt_factor.is_finite() || self.tilt_factor < 0.0 {
            return Err(RondaError::Configuration(format!(
                "tilt_factor must be finite and non-negative, got {}",
                self.tilt_factor
            )));
        }
        if !(0.0..1.0).contains(&self.tilt_range) {
            return Err(RondaError::Configuration(format!(
                "tilt_range must lie in [0, 1), got {}",
                self.tilt_range
            )));
        }
        Ok(())
    }

    /// Initial weights for `scores`, summing to 1.
    ///
    /// Zero score dispersion (including a single name) yields equal weight.
    ///
    /// # Example
    ///
    /// ```
    /// use ronda_construct::TiltConfig;
    ///
    /// let weights = TiltConfig::default().weights(&[0.9, 0.8, 0.7, 0.6]);
    /// assert!((weights[0] - 0.30).abs() < 1e-12);
    /// assert!((weights[3] - 0.20).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn weights(&self, scores: &[f64]) -> Vec<f64> {
        if scores.is_empty() {
            return Vec::new();
        }
        let (z, _) = standardize_array(&Array1::from_vec(scores.to_vec()));
        let low = 1.0 - self.tilt_range;
        let high = 1.0 + self.tilt_range;
        let multipliers = z.mapv(|z| (1.0 + self.tilt_factor * z).max(low).min(high));
        let total = multipliers.sum();
        (multipliers / total).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tilt_toward_higher_scores() {
        let weights = TiltConfig::default().weights(&[0.9, 0.8, 0.7, 0.6]);
        // z = ±1.162, ±0.387; the outer multipliers clip at 1.2 and 0.8
        let middle = 1.0 + 0.2 * 0.05 / (0.05_f64 / 3.0).sqrt();
        assert_relative_eq!(weights[0], 0.30, epsilon = 1e-12);
        assert_relative_eq!(weights[1], middle / 4.0, epsilon = 1e-12);
        assert_relative_eq!(weights[2], (2.0 - middle) / 4.0, epsilon = 1e-12);
        assert_relative_eq!(weights[3], 0.20, epsilon = 1e-12);
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_dispersion_is_equal_weight() {
        let weights = TiltConfig::default().weights(&[0.5, 0.5, 0.5]);
        for w in &weights {
            assert_relative_eq!(*w, 1.0 / 3.0, epsilon = 1e-12);
        }
        assert_eq!(TiltConfig::default().weights(&[0.7]), vec![1.0]);
        assert!(TiltConfig::default().weights(&[]).is_empty());
    }

    #[test]
    fn test_equal_weight_config() {
        let weights = TiltConfig::equal_weight().weights(&[0.9, 0.1]);
        assert_eq!(weights, vec![0.5, 0.5]);
    }

    #[test]
    fn test_validate() {
        assert!(TiltConfig::default().validate().is_ok());
        assert!(TiltConfig { tilt_range: 1.0, ..TiltConfig::default() }.validate().is_err());
        assert!(TiltConfig { tilt_factor: -0.1, ..TiltConfig::default() }.validate().is_err());
    }
}
