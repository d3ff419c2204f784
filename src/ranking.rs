//! Percentile ranks and the composite momentum score.

use serde::Serialize;

use crate::error::{AllocError, Result};
use crate::stocks::{Horizon, HorizonValues, QuoteRecord};
use crate::universe::Universe;

/// A universe row with its percentile ranks and composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub record: QuoteRecord,
    /// Percentile in [0, 1] for each ranked horizon.
    pub percentiles: HorizonValues,
    /// Mean of the ranked percentiles. `None` for unranked (equal-weight) rows.
    pub score: Option<f64>,
}

impl RankedRow {
    /// Row carried through without ranking.
    pub fn unranked(record: QuoteRecord) -> Self {
        RankedRow {
            record,
            percentiles: HorizonValues::default(),
            score: None,
        }
    }
}

/// Percentile of every value against the whole column:
/// `count(values <= v) / n`. Ties share the highest rank of their group, so
/// the column maximum is always 1.0 and the minimum at least `1/n`.
///
/// Sorts one copy of the column and binary-searches it per value.
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    values
        .iter()
        .map(|v| sorted.partition_point(|x| x <= v) as f64 / n)
        .collect()
}

/// Percentile of a single `score` against `values`. `None` for an empty column.
pub fn percentile_of_score(values: &[f64], score: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let at_or_below = values.iter().filter(|v| **v <= score).count();
    Some(at_or_below as f64 / values.len() as f64)
}

/// Arithmetic mean of the row's percentiles for `horizons`.
///
/// Every listed horizon must have a percentile; a gap means a row slipped
/// past universe validation and is reported as a defect.
pub fn composite_score(
    record: &QuoteRecord,
    percentiles: &HorizonValues,
    horizons: &[Horizon],
) -> Result<f64> {
    if horizons.is_empty() {
        return Err(AllocError::Computation(String::from(
            "composite score needs at least one horizon",
        )));
    }

    let mut total = 0.0;
    for horizon in horizons {
        total += percentiles.get(*horizon).ok_or_else(|| {
            AllocError::Computation(format!(
                "{} has no {} percentile",
                record.symbol, horizon
            ))
        })?;
    }
    Ok(total / horizons.len() as f64)
}

/// Rank every row of `universe` on `horizons` and score it.
///
/// Output keeps universe order.
pub fn rank_universe(universe: &Universe, horizons: &[Horizon]) -> Result<Vec<RankedRow>> {
    let mut rows: Vec<RankedRow> = universe.iter().cloned().map(RankedRow::unranked).collect();

    for horizon in horizons {
        let column = universe
            .iter()
            .map(|r| {
                r.return_for(*horizon).ok_or_else(|| {
                    AllocError::Computation(format!(
                        "{} reached ranking without a {} return",
                        r.symbol, horizon
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        for (row, pct) in rows.iter_mut().zip(percentile_ranks(&column)) {
            row.percentiles.set(*horizon, Some(pct));
        }
    }

    for row in rows.iter_mut() {
        row.score = Some(composite_score(&row.record, &row.percentiles, horizons)?);
    }

    Ok(rows)
}
