use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::Parser;
use serde_json::json;
use tradecal_aggregation::TradeAggregator;
use tradecal_core::{Config, TradeDataForYear, TradeRecord};
use tradecal_ingestion::{InlineCsvLoader, TradeCsvLoader};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "tradecal=info";

#[derive(Parser)]
#[command(name = "tradecal")]
#[command(about = "Summarize broker trade history CSVs by calendar day")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory that CSV paths must stay inside
    #[arg(long)]
    root: Option<PathBuf>,

    /// CSV file, relative to the root or absolute inside it
    #[arg(long, conflicts_with = "stdin")]
    csv: Option<String>,

    /// Read CSV content from standard input instead of a file
    #[arg(long)]
    stdin: bool,

    /// Calendar year (defaults to the current year)
    #[arg(long)]
    year: Option<String>,

    /// Only show trades on this date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Validate a year argument. Blank or missing means `fallback`.
fn parse_year(value: Option<&str>, fallback: i32) -> Result<i32> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(fallback);
    };
    let year: i32 = raw
        .parse()
        .with_context(|| format!("year must be a number: {:?}", raw))?;
    if !(1..=9999).contains(&year) {
        bail!("year must be between 1 and 9999: {:?}", raw);
    }
    Ok(year)
}

/// Log filter from `RUST_LOG`, or `tradecal=info` when unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

fn print_trades(iso_date: &str, trades: &[TradeRecord]) {
    println!("{} ({} trades)", iso_date, trades.len());
    for t in trades {
        println!(
            "  {} {:<4} {:<6} {} {} qty={} price={} fee={} net={}",
            t.iso_time,
            t.side,
            t.action,
            t.symbol,
            t.contract_month,
            format_number(t.quantity),
            format_number(t.price),
            format_number(t.fee),
            format_number(t.net_profit),
        );
    }
}

fn print_summaries(year: i32, data: &TradeDataForYear) {
    if data.is_empty() {
        println!("No trades in {}", year);
        return;
    }
    let mut net_total = 0.0;
    for summary in data.summaries.values() {
        net_total += summary.net_profit;
        println!(
            "{}  trades={:<3} buy={:<3} sell={:<3} qty={:<6} net={}",
            summary.iso_date,
            summary.trade_count,
            summary.buy_count,
            summary.sell_count,
            format_number(summary.total_quantity),
            format_number(summary.net_profit),
        );
    }
    println!(
        "{}: {} trading days, {} trades, net {}",
        year,
        data.summaries.len(),
        data.trade_count(),
        format_number(net_total)
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(root) = cli.root {
        config.source.project_root = root;
    }
    if let Some(csv) = cli.csv {
        config.source.csv_path = Some(csv);
    }

    let year = parse_year(cli.year.as_deref(), chrono::Local::now().year())?;

    let aggregator = if cli.stdin {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read standard input")?;
        let loader: Arc<dyn TradeCsvLoader> = Arc::new(InlineCsvLoader::from_bytes(&bytes));
        TradeAggregator::with_loader(config.source, loader)
    } else {
        TradeAggregator::new(config.source)
    };

    let data = aggregator.trade_data_for_year(year)?;
    tracing::debug!(year, days = data.summaries.len(), "aggregated trade data");

    match (&cli.date, cli.json) {
        (Some(date), true) => {
            let trades = data.trades_by_date.get(date).cloned().unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&trades)?);
        }
        (Some(date), false) => match data.trades_by_date.get(date) {
            Some(trades) => print_trades(date, trades),
            None => println!("No trades on {}", date),
        },
        (None, true) => {
            let payload = json!({
                "year": year,
                "tradeSummaries": data.summaries,
                "dailyTrades": data.trades_by_date,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        (None, false) => print_summaries(year, &data),
    }

    Ok(())
}
