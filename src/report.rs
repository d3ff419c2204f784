//! Rendering a `PortfolioPlan` to CSV or JSON.
//!
//! Writers receive the plan read-only and emit rows in plan order with the
//! values unchanged.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Strategy;
use crate::error::Result;
use crate::portfolio::{AllocationRow, PortfolioPlan};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

pub trait ReportWriter {
    fn write_plan(&self, plan: &PortfolioPlan, out: &mut dyn Write) -> Result<()>;
}

/// One row per position. Ranked strategies add return, percentile and score
/// columns for the horizons they rank on.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReport;

impl CsvReport {
    fn header(strategy: Strategy) -> Vec<String> {
        let mut columns = vec![
            String::from("Ticker"),
            String::from("Price"),
            String::from("Market Capitalization"),
        ];
        for horizon in strategy.ranked_horizons() {
            columns.push(format!("{} Price Return", horizon.label()));
            columns.push(format!("{} Return Percentile", horizon.label()));
        }
        if strategy.is_ranked() {
            columns.push(String::from(score_column(strategy)));
        }
        columns.push(String::from("Number of Shares to Buy"));
        columns
    }

    fn row(strategy: Strategy, allocation: &AllocationRow) -> Vec<String> {
        let record = &allocation.row.record;
        let mut cells = vec![
            record.symbol.to_string(),
            record.price.to_string(),
            optional(record.market_cap),
        ];
        for horizon in strategy.ranked_horizons() {
            cells.push(optional(record.return_for(*horizon)));
            cells.push(optional(allocation.row.percentiles.get(*horizon)));
        }
        if strategy.is_ranked() {
            cells.push(optional(allocation.row.score));
        }
        cells.push(allocation.shares.to_string());
        cells
    }
}

impl ReportWriter for CsvReport {
    fn write_plan(&self, plan: &PortfolioPlan, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", CsvReport::header(plan.strategy).join(","))?;
        for allocation in &plan.rows {
            writeln!(out, "{}", CsvReport::row(plan.strategy, allocation).join(","))?;
        }
        Ok(())
    }
}

/// The whole plan as pretty JSON, with the cash summary and dropped symbols.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReport;

#[derive(Serialize)]
struct PlanDocument<'a> {
    #[serde(flatten)]
    plan: &'a PortfolioPlan,
    total_invested: f64,
    uninvested: f64,
}

impl ReportWriter for JsonReport {
    fn write_plan(&self, plan: &PortfolioPlan, out: &mut dyn Write) -> Result<()> {
        let document = PlanDocument {
            plan,
            total_invested: plan.total_invested(),
            uninvested: plan.uninvested(),
        };
        serde_json::to_writer_pretty(&mut *out, &document)?;
        writeln!(out)?;
        Ok(())
    }
}

fn score_column(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::HighQualityMomentum => "HQM Score",
        _ => "Momentum Score",
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn writer_for(format: OutputFormat) -> Box<dyn ReportWriter> {
    match format {
        OutputFormat::Csv => Box::new(CsvReport),
        OutputFormat::Json => Box::new(JsonReport),
    }
}

/// Write the report next to `path` and rename it into place.
pub fn write_report_file(path: &Path, format: OutputFormat, plan: &PortfolioPlan) -> Result<()> {
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");

    {
        let mut out = BufWriter::new(File::create(&tmp_path)?);
        writer_for(format).write_plan(plan, &mut out)?;
        out.flush()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
