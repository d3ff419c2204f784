//! Stock symbols, return horizons and quote records
//!
//! This module handles:
//! - Parsing and normalizing ticker symbols
//! - Loading the symbol universe from a plain-text list
//! - The per-symbol quote record produced by a fetch

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use crate::error::{Result, ValidationError};

pub const MAX_SYMBOL_LEN: usize = 15;

/// Normalized (trimmed, uppercase) ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        if normalized.chars().count() > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                symbol: normalized,
                max: MAX_SYMBOL_LEN,
            });
        }

        if let Some(ch) = normalized
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '.' || *ch == '-'))
        {
            return Err(ValidationError::SymbolInvalidChar {
                symbol: normalized,
                ch,
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

/// Trailing window a price return is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    OneYear,
    SixMonth,
    ThreeMonth,
    OneMonth,
}

impl Horizon {
    /// Longest window first, the order reports list them in.
    pub const ALL: [Horizon; 4] = [
        Horizon::OneYear,
        Horizon::SixMonth,
        Horizon::ThreeMonth,
        Horizon::OneMonth,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneYear => "one_year",
            Self::SixMonth => "six_month",
            Self::ThreeMonth => "three_month",
            Self::OneMonth => "one_month",
        }
    }

    /// Human-readable column prefix, e.g. "One-Year".
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneYear => "One-Year",
            Self::SixMonth => "Six-Month",
            Self::ThreeMonth => "Three-Month",
            Self::OneMonth => "One-Month",
        }
    }
}

impl Display for Horizon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One optional value per horizon. Used both for raw returns and for their
/// percentile ranks. `None` means "no data" and is never read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizonValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_year: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub six_month: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub three_month: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_month: Option<f64>,
}

impl HorizonValues {
    pub fn get(&self, horizon: Horizon) -> Option<f64> {
        match horizon {
            Horizon::OneYear => self.one_year,
            Horizon::SixMonth => self.six_month,
            Horizon::ThreeMonth => self.three_month,
            Horizon::OneMonth => self.one_month,
        }
    }

    pub fn set(&mut self, horizon: Horizon, value: Option<f64>) {
        let slot = match horizon {
            Horizon::OneYear => &mut self.one_year,
            Horizon::SixMonth => &mut self.six_month,
            Horizon::ThreeMonth => &mut self.three_month,
            Horizon::OneMonth => &mut self.one_month,
        };
        *slot = value;
    }
}

/// Price and trailing returns for one symbol, as returned by one fetch.
///
/// Returns are signed fractions (`-0.05` is a 5% loss).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub symbol: Symbol,
    pub price: f64,
    pub returns: HorizonValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

impl QuoteRecord {
    pub fn new(symbol: Symbol, price: f64) -> Self {
        QuoteRecord {
            symbol,
            price,
            returns: HorizonValues::default(),
            market_cap: None,
        }
    }

    pub fn with_return(mut self, horizon: Horizon, value: f64) -> Self {
        self.returns.set(horizon, Some(value));
        self
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    /// Return for `horizon`, treating non-finite values as missing.
    pub fn return_for(&self, horizon: Horizon) -> Option<f64> {
        self.returns.get(horizon).filter(|v| v.is_finite())
    }

    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// Parse a symbol list. Symbols may be separated by newlines, commas or
/// whitespace; lines starting with `#` are comments. Duplicates are dropped,
/// keeping the first occurrence.
pub fn parse_symbols(text: &str) -> Result<Vec<Symbol>, ValidationError> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        for token in line.split(|c: char| c == ',' || c.is_whitespace()) {
            if token.trim().is_empty() {
                continue;
            }
            let symbol = Symbol::parse(token)?;
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            } else {
                warn!("duplicate symbol {} in universe list ignored", symbol);
            }
        }
    }

    Ok(symbols)
}

pub fn load_symbols(path: &Path) -> Result<Vec<Symbol>> {
    let contents = fs::read_to_string(path)?;
    let symbols = parse_symbols(&contents)?;
    if symbols.is_empty() {
        return Err(ValidationError::EmptyUniverse.into());
    }
    Ok(symbols)
}
