//! Cross-sectional percentile normalization.
//!
//! Raw values become average-rank percentiles in (0, 1]: the best value maps
//! to 1.0 and tied values share the mean of the ranks they span. Instruments
//! without a value are left out of the ranking and stay `None`.

use std::collections::BTreeMap;

use ronda_traits::stats::percentile_ranks;

/// Default smallest sector bucket ranked on its own.
pub const DEFAULT_MIN_BUCKET_SIZE: usize = 3;

/// Percentile-rank `values` across the whole cross-section.
///
/// # Examples
///
/// ```
/// use ronda_factors::normalize::percentile_normalize;
///
/// let pct = percentile_normalize(&[Some(0.1), None, Some(0.3), Some(0.2)]);
/// assert_eq!(pct, vec![Some(1.0 / 3.0), None, Some(1.0), Some(2.0 / 3.0)]);
/// ```
#[must_use]
pub fn percentile_normalize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let indices: Vec<usize> = (0..values.len()).collect();
    let mut out = vec![None; values.len()];
    rank_group(values, &indices, &mut out);
    out
}

/// Percentile-rank `values` within the sector buckets given by `sectors`.
///
/// A bucket with fewer than `min_bucket_size` valued instruments is too small
/// for a meaningful ranking; its members take their universe-wide percentile
/// instead.
///
/// # Panics
///
/// Panics if `values` and `sectors` differ in length.
#[must_use]
pub fn sector_percentile_normalize(
    values: &[Option<f64>],
    sectors: &[&str],
    min_bucket_size: usize,
) -> Vec<Option<f64>> {
    assert_eq!(values.len(), sectors.len(), "one sector per value");

    let universe = percentile_normalize(values);

    let mut buckets: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, sector) in sectors.iter().enumerate() {
        if values[i].is_some() {
            buckets.entry(sector).or_default().push(i);
        }
    }

    let mut out = universe;
    for members in buckets.values() {
        if members.len() >= min_bucket_size {
            rank_group(values, members, &mut out);
        }
    }
    out
}

fn rank_group(values: &[Option<f64>], members: &[usize], out: &mut [Option<f64>]) {
    let (indices, raw): (Vec<usize>, Vec<f64>) =
        members.iter().filter_map(|&i| values[i].map(|v| (i, v))).unzip();
    for (i, pct) in indices.into_iter().zip(percentile_ranks(&raw)) {
        out[i] = Some(pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ties_share_average_rank() {
        let pct = percentile_normalize(&[Some(1.0), Some(1.0), Some(2.0), Some(0.0)]);
        assert_eq!(pct, vec![Some(0.625), Some(0.625), Some(1.0), Some(0.25)]);
    }

    #[test]
    fn test_missing_values_are_left_out() {
        let pct = percentile_normalize(&[None, Some(5.0), None]);
        assert_eq!(pct, vec![None, Some(1.0), None]);
        assert!(percentile_normalize(&[]).is_empty());
    }

    #[test]
    fn test_sector_buckets() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(10.0), Some(20.0), Some(30.0)];
        let sectors = ["Tech", "Tech", "Tech", "Energy", "Energy", "Energy"];
        let pct = sector_percentile_normalize(&values, &sectors, 3);
        // Each sector ranks its own members
        assert_relative_eq!(pct[2].unwrap(), 1.0);
        assert_relative_eq!(pct[5].unwrap(), 1.0);
        assert_relative_eq!(pct[0].unwrap(), 1.0 / 3.0);
        assert_relative_eq!(pct[3].unwrap(), 1.0 / 3.0);
    }

    #[test]
    fn test_small_bucket_falls_back_to_universe() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(10.0)];
        let sectors = ["Tech", "Tech", "Tech", "Energy"];
        let pct = sector_percentile_normalize(&values, &sectors, 3);
        assert_relative_eq!(pct[2].unwrap(), 1.0);
        // Lone Energy name keeps its universe-wide percentile
        assert_relative_eq!(pct[3].unwrap(), 1.0);
        assert_relative_eq!(pct[0].unwrap(), 1.0 / 3.0);

        let strict = sector_percentile_normalize(&values, &sectors, 5);
        assert_eq!(strict, percentile_normalize(&values));
    }

    #[test]
    fn test_missing_values_do_not_count_toward_bucket_size() {
        let values = [Some(1.0), Some(2.0), None, Some(10.0), Some(20.0)];
        let sectors = ["Tech", "Tech", "Tech", "Energy", "Energy"];
        let pct = sector_percentile_normalize(&values, &sectors, 3);
        assert_eq!(pct, percentile_normalize(&values));
        assert_eq!(pct[2], None);
    }
}
