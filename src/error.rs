//! Error types for the allocation pipeline.
//!
//! `ValidationError` and `FetchError` are raised by individual stages and fold
//! into `AllocError`, so the pipeline can propagate a single error type. Symbols
//! dropped for missing or invalid data are not errors; they travel with the
//! plan as `DroppedSymbol` entries.
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Rejected input. Fatal to the current run and never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("batch size must be positive")]
    ZeroBatchSize,

    #[error("batch size {size} exceeds the provider limit of {max}")]
    BatchSizeTooLarge { size: usize, max: usize },

    #[error("at least one fetch must be allowed in flight")]
    ZeroConcurrency,

    #[error("request timeout must be at least one second")]
    ZeroTimeout,

    #[error("budget must be a positive amount, got {0}")]
    NonPositiveBudget(f64),

    #[error("could not read a budget amount from '{0}'")]
    UnparsableBudget(String),

    #[error("number of positions to select must be positive")]
    ZeroSelection,

    #[error("no eligible rows to allocate across")]
    NoEligibleRows,

    #[error("price for {symbol} must be positive, got {price}")]
    NonPositivePrice { symbol: String, price: f64 },

    #[error("symbol is empty")]
    EmptySymbol,

    #[error("symbol '{symbol}' is longer than {max} characters")]
    SymbolTooLong { symbol: String, max: usize },

    #[error("symbol '{symbol}' contains invalid character '{ch}'")]
    SymbolInvalidChar { symbol: String, ch: char },

    #[error("symbol list is empty")]
    EmptyUniverse,
}

/// A batch request that failed as a unit. No rows from the batch are used.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request for batch starting at {first} failed: {source}")]
    Transport {
        first: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("provider answered HTTP {status} for batch starting at {first}: {body}")]
    Status {
        first: String,
        status: u16,
        body: String,
    },

    #[error("could not decode provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("batch request timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error for one pipeline run.
#[derive(Error, Debug)]
pub enum AllocError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// An invariant that upstream validation should have made impossible.
    #[error("computation defect: {0}")]
    Computation(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide `Result` alias defaulting to `AllocError`.
pub type Result<T, E = AllocError> = std::result::Result<T, E>;
