//! Command-line arguments for the allocator.
//!
//! Any flag left unset falls back to the `--config` file, then to the
//! built-in defaults.
use std::path::PathBuf;

use clap::Parser;
use momentum_alloc::budget::parse_budget;
use momentum_alloc::config::{Config, Strategy};
use momentum_alloc::report::OutputFormat;
use momentum_alloc::Result;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// JSON file with a full or partial configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Text file with the symbol universe (one per line or comma separated).
    #[arg(long)]
    pub symbols: Option<PathBuf>,

    /// Total cash to invest, e.g. 10000, "$1,000,000" or 2.5k.
    #[arg(long, env = "MOMENTUM_BUDGET", value_parser = parse_budget)]
    pub budget: Option<f64>,

    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Positions kept by the ranked strategies.
    #[arg(long)]
    pub top: Option<usize>,

    /// Symbols per provider request (1-100).
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Batch requests allowed in flight at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "MOMENTUM_API_URL")]
    pub api_url: Option<String>,

    #[arg(long, env = "MOMENTUM_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Where to write the report. Nothing is written when omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl Args {
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(symbols) = self.symbols {
            config.symbols_path = symbols;
        }
        if let Some(budget) = self.budget {
            config.budget = budget;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(top) = self.top {
            config.top_n = top;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent_fetches = concurrency;
        }
        if let Some(timeout) = self.timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(api_url) = self.api_url {
            config.api_url = api_url;
        }
        if let Some(api_token) = self.api_token {
            config.api_token = api_token;
        }
        if self.output.is_some() {
            config.output_path = self.output;
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }

        Ok(config)
    }
}
