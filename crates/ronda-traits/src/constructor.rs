//! Portfolio constructor trait.

use crate::portfolio::Portfolio;
use crate::scorer::CompositeScore;
use crate::types::Date;
use crate::Result;

/// Turns ranked composite scores into a constrained [`Portfolio`].
///
/// Implementations hold their constraint set immutably. Construction must be
/// deterministic: the same scores, in any order, yield bit-identical weights.
pub trait PortfolioConstructor: Send + Sync {
    /// Returns the name of this constructor, used in logs.
    fn name(&self) -> &str;

    /// Builds the portfolio for `as_of` from the scored universe.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RondaError::InsufficientCandidates`] or
    /// [`crate::RondaError::InfeasibleConstraint`] when no valid portfolio
    /// exists, and [`crate::RondaError::ConstraintNotConverged`] when weight
    /// enforcement runs out of passes.
    fn construct(&self, as_of: Date, scored: &[CompositeScore]) -> Result<Portfolio>;
}
