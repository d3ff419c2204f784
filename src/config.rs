//! Run configuration.
//!
//! Everything a run needs is carried in `Config` and handed to the pipeline
//! explicitly. The binary fills it from an optional JSON file and then
//! applies command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::batch::{validate_batch_size, MAX_BATCH_SIZE};
use crate::budget::validate_budget;
use crate::error::{Result, ValidationError};
use crate::report::OutputFormat;
use crate::stocks::Horizon;
use crate::universe::FetchSettings;

pub const DEFAULT_API_URL: &str = "https://cloud.iexapis.com/stable";
pub const DEFAULT_TOP_N: usize = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// How the budget is spread across the universe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Every symbol in the universe, equal dollar amount each.
    #[default]
    EqualWeight,
    /// Top-N by one-year return.
    Momentum,
    /// Top-N by the mean percentile of the four return horizons.
    #[value(alias = "hqm")]
    HighQualityMomentum,
}

impl Strategy {
    /// Horizons whose percentiles feed the composite score.
    pub const fn ranked_horizons(self) -> &'static [Horizon] {
        match self {
            Self::EqualWeight => &[],
            Self::Momentum => &[Horizon::OneYear],
            Self::HighQualityMomentum => &Horizon::ALL,
        }
    }

    /// Return fields a record must carry to stay in the universe.
    pub const fn required_horizons(self) -> &'static [Horizon] {
        self.ranked_horizons()
    }

    pub const fn is_ranked(self) -> bool {
        !matches!(self, Self::EqualWeight)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EqualWeight => "equal-weight",
            Self::Momentum => "momentum",
            Self::HighQualityMomentum => "high-quality-momentum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub api_token: String,
    /// Total investable cash.
    pub budget: f64,
    pub strategy: Strategy,
    /// Positions kept by the ranked strategies.
    pub top_n: usize,
    pub batch_size: usize,
    pub max_concurrent_fetches: usize,
    pub request_timeout_secs: u64,
    pub symbols_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: String::new(),
            budget: 0.0,
            strategy: Strategy::default(),
            top_n: DEFAULT_TOP_N,
            batch_size: MAX_BATCH_SIZE,
            max_concurrent_fetches: 1,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            symbols_path: PathBuf::from("symbols.txt"),
            output_path: None,
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Check every numeric setting. Runs before any fetch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_budget(self.budget)?;
        validate_batch_size(self.batch_size)?;
        if self.max_concurrent_fetches == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        if self.strategy.is_ranked() && self.top_n == 0 {
            return Err(ValidationError::ZeroSelection);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            batch_size: self.batch_size,
            max_concurrent: self.max_concurrent_fetches,
            timeout: self.request_timeout(),
        }
    }
}
