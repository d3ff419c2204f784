//! Building the per-run universe of quote records.
//!
//! All batches are fetched first, then the table is assembled in one pass
//! over the requested symbols. Rows that cannot be ranked are dropped here,
//! before any percentile is computed, and every drop is recorded.

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use serde::Serialize;

use crate::batch::batches;
use crate::error::{FetchError, Result};
use crate::fetcher::{QuoteFetcher, QuoteMap};
use crate::stocks::{Horizon, QuoteRecord, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub batch_size: usize,
    /// Batches allowed in flight at once. 1 fetches sequentially.
    pub max_concurrent: usize,
    /// Per-batch deadline. An expired batch fails the run.
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// The batch response had no entry for the symbol.
    MissingFromBatch,
    /// A return the strategy ranks on was null or not a number.
    MissingReturn { horizon: Horizon },
    /// Price absent, zero, negative or not a number.
    InvalidPrice,
}

impl Display for DropReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFromBatch => f.write_str("missing from batch response"),
            Self::MissingReturn { horizon } => write!(f, "no {} return", horizon),
            Self::InvalidPrice => f.write_str("invalid price"),
        }
    }
}

/// A symbol removed from the universe, reported with the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedSymbol {
    pub symbol: Symbol,
    pub reason: DropReason,
}

/// Validated quote records for one run, in original symbol order.
///
/// Read-only once built. Later stages derive new tables from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Universe {
    records: Vec<QuoteRecord>,
}

impl Universe {
    pub fn records(&self) -> &[QuoteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuoteRecord> {
        self.records.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniverseBuild {
    pub universe: Universe,
    pub dropped: Vec<DroppedSymbol>,
}

/// Check a record against the fields the strategy needs.
pub fn validate_record(record: &QuoteRecord, required: &[Horizon]) -> Result<(), DropReason> {
    if !record.has_valid_price() {
        return Err(DropReason::InvalidPrice);
    }
    match required.iter().find(|h| record.return_for(**h).is_none()) {
        Some(horizon) => Err(DropReason::MissingReturn { horizon: *horizon }),
        None => Ok(()),
    }
}

/// Assemble the universe from fetched records, walking `requested` in order.
pub fn assemble(
    requested: &[Symbol],
    mut fetched: HashMap<Symbol, QuoteRecord>,
    required: &[Horizon],
) -> UniverseBuild {
    let mut seen = HashSet::with_capacity(requested.len());
    let mut records = Vec::with_capacity(requested.len());
    let mut dropped = Vec::new();

    for symbol in requested {
        if !seen.insert(symbol) {
            continue;
        }

        let reason = match fetched.remove(symbol) {
            None => DropReason::MissingFromBatch,
            Some(mut record) => match validate_record(&record, required) {
                Ok(()) => {
                    record.symbol = symbol.clone();
                    records.push(record);
                    continue;
                }
                Err(reason) => reason,
            },
        };

        warn!("dropping {}: {}", symbol, reason);
        dropped.push(DroppedSymbol {
            symbol: symbol.clone(),
            reason,
        });
    }

    UniverseBuild {
        universe: Universe { records },
        dropped,
    }
}

/// Fetch every batch and build the universe.
///
/// Fails on the first batch error; in-flight batches are cancelled and no
/// rows from a failed batch are kept. Only records for symbols a batch asked
/// for are accepted from that batch.
pub async fn build_universe<F>(
    fetcher: &F,
    symbols: &[Symbol],
    settings: &FetchSettings,
    required: &[Horizon],
) -> Result<UniverseBuild>
where
    F: QuoteFetcher + ?Sized,
{
    let groups = batches(symbols, settings.batch_size)?;
    let total = groups.len();
    let timeout = settings.timeout;

    let responses: Vec<(&[Symbol], QuoteMap)> = stream::iter(groups.enumerate())
        .map(|(index, batch)| async move {
            let records = tokio::time::timeout(timeout, fetcher.fetch(batch))
                .await
                .map_err(|_| FetchError::Timeout(timeout))??;
            info!(
                "batch {}/{}: {} of {} symbols returned",
                index + 1,
                total,
                records.len(),
                batch.len()
            );
            Ok::<_, FetchError>((batch, records))
        })
        .buffer_unordered(settings.max_concurrent.max(1))
        .try_collect()
        .await?;

    let mut fetched = HashMap::with_capacity(symbols.len());
    for (batch, mut records) in responses {
        for symbol in batch {
            if let Some(record) = records.remove(symbol) {
                fetched.insert(symbol.clone(), record);
            }
        }
        for stray in records.keys() {
            debug!("ignoring unrequested symbol {} in batch response", stray);
        }
    }

    let build = assemble(symbols, fetched, required);
    info!(
        "universe built: {} usable, {} dropped",
        build.universe.len(),
        build.dropped.len()
    );
    Ok(build)
}
