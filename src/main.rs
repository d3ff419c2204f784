use clap::Parser;
use env_logger::Env;
use log::info;
use std::error::Error;

use momentum_alloc::fetcher::HttpQuoteFetcher;
use momentum_alloc::pipeline;
use momentum_alloc::portfolio::PortfolioPlan;
use momentum_alloc::report::write_report_file;
use momentum_alloc::stocks::load_symbols;

mod cli;

fn print_summary(plan: &PortfolioPlan) {
    println!("Strategy:       {}", plan.strategy.as_str());
    println!("Budget:         ${:.2}", plan.budget);
    println!("Position size:  ${:.2}", plan.position_size);
    println!(
        "Positions:      {} ({} funded)",
        plan.rows.len(),
        plan.funded_positions()
    );
    println!("Invested:       ${:.2}", plan.total_invested());
    println!("Uninvested:     ${:.2}", plan.uninvested());

    if !plan.dropped.is_empty() {
        println!("Dropped symbols ({}):", plan.dropped.len());
        for dropped in &plan.dropped {
            println!("  {:<8} {}", dropped.symbol, dropped.reason);
        }
    }

    println!();
    for row in &plan.rows {
        println!(
            "  {:<8} {:>10.2} x {:>6}",
            row.row.record.symbol, row.row.record.price, row.shares
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = cli::Args::parse().into_config()?;
    config.validate()?;

    let symbols = load_symbols(&config.symbols_path)?;
    info!(
        "loaded {} symbols from {}",
        symbols.len(),
        config.symbols_path.display()
    );

    let fetcher = HttpQuoteFetcher::from_config(&config)?;
    let plan = pipeline::run(&config, &symbols, &fetcher).await?;

    print_summary(&plan);

    if let Some(path) = &config.output_path {
        write_report_file(path, config.output_format, &plan)?;
        info!("report written to {}", path.display());
    }

    Ok(())
}
