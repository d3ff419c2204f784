//! Equal-weight and momentum share allocation.
//!
//! A run takes a symbol universe, a budget and a strategy, and produces a
//! `PortfolioPlan` with a whole-share count per selected symbol:
//!
//! - `batch`: split symbols into provider-sized groups.
//! - `fetcher`: `QuoteFetcher` seam and the HTTP batch client.
//! - `universe`: assemble and validate the per-run quote table.
//! - `ranking`: percentile ranks and the composite momentum score.
//! - `selection`: top-N by score, or the whole universe.
//! - `portfolio`: equal position sizes converted to whole shares.
//! - `report`: CSV and JSON output.
//! - `pipeline`: the glue for one run.
pub mod batch;
pub mod budget;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod portfolio;
pub mod ranking;
pub mod report;
pub mod selection;
pub mod stocks;
pub mod universe;

pub use config::{Config, Strategy};
pub use error::{AllocError, FetchError, Result, ValidationError};
pub use fetcher::{HttpQuoteFetcher, QuoteFetcher};
pub use portfolio::{AllocationRow, PortfolioPlan};
pub use stocks::{Horizon, QuoteRecord, Symbol};
pub use universe::{DropReason, DroppedSymbol, Universe};
