//! Choosing which rows receive a position.

use crate::error::ValidationError;
use crate::ranking::RankedRow;
use crate::universe::Universe;

/// Keep the `n` highest-scoring rows.
///
/// Sorting is stable, so rows with equal scores keep their universe order
/// and the result is deterministic. Unscored rows sort last.
pub fn select_top(mut rows: Vec<RankedRow>, n: usize) -> Result<Vec<RankedRow>, ValidationError> {
    if n == 0 {
        return Err(ValidationError::ZeroSelection);
    }

    rows.sort_by(|a, b| sort_key(b).total_cmp(&sort_key(a)));
    rows.truncate(n);
    Ok(rows)
}

/// Equal-weight selection: the whole universe, in order, unranked.
pub fn select_all(universe: &Universe) -> Vec<RankedRow> {
    universe.iter().cloned().map(RankedRow::unranked).collect()
}

fn sort_key(row: &RankedRow) -> f64 {
    row.score.unwrap_or(f64::NEG_INFINITY)
}
