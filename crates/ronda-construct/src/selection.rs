//! Candidate selection under count and sector-diversity limits.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ronda_traits::{CompositeScore, Date, Result, RondaError};
use tracing::debug;

use crate::constraints::{CAP_TOLERANCE, ConstraintSet};

/// Rank order: composite descending, ties by ticker.
pub(crate) fn by_rank(a: &CompositeScore, b: &CompositeScore) -> Ordering {
    b.composite.total_cmp(&a.composite).then_with(|| a.ticker.cmp(&b.ticker))
}

/// Sector cap reachable by `n` names of one sector.
fn sector_capacity(n: usize, constraints: &ConstraintSet) -> f64 {
    constraints.max_weight_per_sector.min(n as f64 * constraints.max_weight_per_position)
}

fn sector_counts<'a>(selected: &[&'a CompositeScore]) -> BTreeMap<&'a str, usize> {
    let mut held = BTreeMap::new();
    for s in selected.iter().copied() {
        *held.entry(s.sector.as_str()).or_insert(0) += 1;
    }
    held
}

/// Total weight the selection can carry under both caps.
pub(crate) fn total_capacity(selected: &[&CompositeScore], constraints: &ConstraintSet) -> f64 {
    sector_counts(selected).values().map(|&n| sector_capacity(n, constraints)).sum()
}

/// Pick the names to hold, best first.
///
/// Eligible names have a finite composite of at least `min_score`. The top
/// `max_position_count` are taken, then two repairs run against the
/// remaining eligible names, best first:
///
/// 1. while fewer than `min_sector_count` sectors are held, the lowest-ranked
///    name of the most crowded sector makes way for the best name of a
///    missing sector;
/// 2. while the sector caps cannot add up to a fully invested portfolio, the
///    lowest-ranked name of the sector furthest over its cap makes way for
///    the best name whose sector still has room.
///
/// # Errors
///
/// Returns [`RondaError::InsufficientCandidates`] when fewer than
/// `min_position_count` names are eligible, and
/// [`RondaError::InfeasibleConstraint`] when the eligible names run out
/// before the sector minimum or the caps can be met.
pub fn select_candidates<'a>(
    as_of: Date,
    scored: &'a [CompositeScore],
    constraints: &ConstraintSet,
) -> Result<Vec<&'a CompositeScore>> {
    let mut eligible: Vec<&CompositeScore> =
        scored.iter().filter(|s| s.composite.is_finite() && s.composite >= constraints.min_score).collect();
    eligible.sort_by(|a, b| by_rank(a, b));

    if eligible.len() < constraints.min_position_count {
        return Err(RondaError::InsufficientCandidates {
            date: as_of,
            available: eligible.len(),
            required: constraints.min_position_count,
        });
    }

    let take = eligible.len().min(constraints.max_position_count);
    let mut reserve = eligible.split_off(take);
    let mut selected = eligible;

    loop {
        let held = sector_counts(&selected);
        if held.len() >= constraints.min_sector_count {
            break;
        }

        let incoming = reserve.iter().position(|c| !held.contains_key(c.sector.as_str())).ok_or_else(|| {
            RondaError::InfeasibleConstraint {
                date: as_of,
                reason: format!(
                    "{} sectors available among eligible names, {} required",
                    held.len(),
                    constraints.min_sector_count
                ),
            }
        })?;
        let crowded = held.values().copied().max().unwrap_or(0);
        let outgoing = selected.iter().rposition(|s| crowded > 1 && held[s.sector.as_str()] == crowded).ok_or_else(
            || RondaError::InfeasibleConstraint {
                date: as_of,
                reason: format!(
                    "{} positions cannot cover {} sectors",
                    selected.len(),
                    constraints.min_sector_count
                ),
            },
        )?;

        selected[outgoing] = reserve.remove(incoming);
        selected.sort_by(|a, b| by_rank(a, b));
    }

    loop {
        let capacity = total_capacity(&selected, constraints);
        if capacity >= 1.0 - CAP_TOLERANCE {
            break;
        }

        let held = sector_counts(&selected);
        let overflow = |n: usize| n as f64 * constraints.max_weight_per_position - constraints.max_weight_per_sector;
        let swap = held
            .iter()
            .filter(|(_, n)| **n > 1 && overflow(**n) > 0.0)
            .max_by(|a, b| overflow(*a.1).total_cmp(&overflow(*b.1)))
            .and_then(|(crowded, &n)| {
                let lost = sector_capacity(n, constraints) - sector_capacity(n - 1, constraints);
                let incoming = reserve.iter().position(|c| {
                    let m = held.get(c.sector.as_str()).copied().unwrap_or(0);
                    c.sector != *crowded
                        && sector_capacity(m + 1, constraints) - sector_capacity(m, constraints) > lost + CAP_TOLERANCE
                })?;
                let outgoing = selected.iter().rposition(|s| s.sector == *crowded)?;
                Some((outgoing, incoming))
            });
        let Some((outgoing, incoming)) = swap else {
            return Err(RondaError::InfeasibleConstraint {
                date: as_of,
                reason: format!(
                    "{} sectors can hold at most {capacity:.4} under sector cap {} and no eligible name adds room",
                    held.len(),
                    constraints.max_weight_per_sector
                ),
            });
        };

        debug!(
            %as_of,
            outgoing = %selected[outgoing].ticker,
            incoming = %reserve[incoming].ticker,
            capacity,
            "Swapping name out of a crowded sector"
        );
        selected[outgoing] = reserve.remove(incoming);
        selected.sort_by(|a, b| by_rank(a, b));
    }

    Ok(selected)
}
