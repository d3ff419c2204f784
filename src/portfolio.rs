use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::budget::validate_budget;
use crate::config::Strategy;
use crate::error::ValidationError;
use crate::ranking::RankedRow;
use crate::universe::DroppedSymbol;

/// A selected row with its whole-share count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRow {
    #[serde(flatten)]
    pub row: RankedRow,
    pub shares: u64,
}

impl AllocationRow {
    pub fn cost(&self) -> f64 {
        self.shares as f64 * self.row.record.price
    }
}

/// Final allocation handed to the report writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioPlan {
    pub strategy: Strategy,
    pub budget: f64,
    /// Cash allotted to each position before rounding down to whole shares.
    pub position_size: f64,
    pub rows: Vec<AllocationRow>,
    /// Symbols removed from the universe for missing or invalid data.
    pub dropped: Vec<DroppedSymbol>,
    pub generated_at: DateTime<Utc>,
}

impl PortfolioPlan {
    pub fn new(
        strategy: Strategy,
        budget: f64,
        allocation: Allocation,
        dropped: Vec<DroppedSymbol>,
    ) -> Self {
        PortfolioPlan {
            strategy,
            budget,
            position_size: allocation.position_size,
            rows: allocation.rows,
            dropped,
            generated_at: Utc::now(),
        }
    }

    pub fn total_invested(&self) -> f64 {
        calculate_portfolio_cost(&self.rows)
    }

    /// Cash left over after rounding every position down. Reported, not an error.
    pub fn uninvested(&self) -> f64 {
        self.budget - self.total_invested()
    }

    /// Rows that received at least one share.
    pub fn funded_positions(&self) -> usize {
        self.rows.iter().filter(|r| r.shares > 0).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub position_size: f64,
    pub rows: Vec<AllocationRow>,
}

fn calculate_portfolio_cost(rows: &[AllocationRow]) -> f64 {
    rows.iter().map(AllocationRow::cost).sum()
}

/// Equal slice of the budget per row.
pub fn position_size(budget: f64, count: usize) -> Result<f64, ValidationError> {
    let budget = validate_budget(budget)?;
    if count == 0 {
        return Err(ValidationError::NoEligibleRows);
    }
    Ok(budget / count as f64)
}

/// Whole shares of `price` affordable with `position_size`.
///
/// The floor is stepped down once more if float rounding would let
/// `shares * price` exceed the position.
pub fn shares_for(position_size: f64, price: f64) -> u64 {
    let mut shares = (position_size / price).floor().max(0.0) as u64;
    if shares > 0 && shares as f64 * price > position_size {
        shares -= 1;
    }
    shares
}

/// Split `budget` evenly across `rows` and convert each slice to whole shares.
///
/// Every row must have a positive price. Leftover cash is not redistributed.
pub fn allocate(budget: f64, rows: Vec<RankedRow>) -> Result<Allocation, ValidationError> {
    let position_size = position_size(budget, rows.len())?;

    if let Some(bad) = rows
        .iter()
        .find(|r| !(r.record.price.is_finite() && r.record.price > 0.0))
    {
        return Err(ValidationError::NonPositivePrice {
            symbol: bad.record.symbol.to_string(),
            price: bad.record.price,
        });
    }

    let rows: Vec<AllocationRow> = rows
        .into_iter()
        .map(|row| {
            let shares = shares_for(position_size, row.record.price);
            AllocationRow { row, shares }
        })
        .collect();

    let total_cost = calculate_portfolio_cost(&rows);
    info!(
        "allocated ${:.2} of ${:.2} across {} positions (${:.2} each, ${:.2} uninvested)",
        total_cost,
        budget,
        rows.len(),
        position_size,
        budget - total_cost
    );

    Ok(Allocation {
        position_size,
        rows,
    })
}
