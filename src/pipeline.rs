//! One allocation run: validate, fetch, rank, select, allocate.

use log::{info, warn};

use crate::config::{Config, Strategy};
use crate::error::{Result, ValidationError};
use crate::fetcher::QuoteFetcher;
use crate::portfolio::{allocate, PortfolioPlan};
use crate::ranking::{rank_universe, RankedRow};
use crate::selection::{select_all, select_top};
use crate::stocks::Symbol;
use crate::universe::{build_universe, Universe};

/// Run the pipeline for `symbols` with the given configuration.
///
/// Settings are validated before the first request, so a bad budget never
/// reaches the provider. Dropped symbols are returned in the plan.
pub async fn run<F>(config: &Config, symbols: &[Symbol], fetcher: &F) -> Result<PortfolioPlan>
where
    F: QuoteFetcher + ?Sized,
{
    config.validate()?;
    if symbols.is_empty() {
        return Err(ValidationError::EmptyUniverse.into());
    }

    let strategy = config.strategy;
    info!(
        "running {} allocation over {} symbols with ${:.2}",
        strategy.as_str(),
        symbols.len(),
        config.budget
    );

    let build = build_universe(
        fetcher,
        symbols,
        &config.fetch_settings(),
        strategy.required_horizons(),
    )
    .await?;

    if !build.dropped.is_empty() {
        warn!(
            "{} of {} symbols dropped from the universe",
            build.dropped.len(),
            symbols.len()
        );
    }
    if build.universe.is_empty() {
        return Err(ValidationError::NoEligibleRows.into());
    }

    let selected = select(strategy, &build.universe, config.top_n)?;
    let allocation = allocate(config.budget, selected)?;

    Ok(PortfolioPlan::new(
        strategy,
        config.budget,
        allocation,
        build.dropped,
    ))
}

/// Rows that receive a position under `strategy`.
pub fn select(strategy: Strategy, universe: &Universe, top_n: usize) -> Result<Vec<RankedRow>> {
    if !strategy.is_ranked() {
        return Ok(select_all(universe));
    }
    let ranked = rank_universe(universe, strategy.ranked_horizons())?;
    Ok(select_top(ranked, top_n)?)
}
