// Entry point and high-level CLI flow.
//
// The binary is thin glue around the pipeline modules: parse arguments,
// load each platform export, build (or merge) the report document, write it
// once, and print a short summary of what was produced.
mod columns;
mod decode;
mod error;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use anyhow::{bail, Context, Result};
use clap::Parser;
use columns::{ColumnMaps, ColumnOverrides};
use loader::CsvLoader;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use types::{ClientInfo, MonthPreviewRow};
use util::format_int;

/// Convert daily ad-platform CSV exports into an aggregated report document.
#[derive(Parser, Debug)]
#[command(
    name = "ad-report",
    about = "Convert daily ad-platform CSV exports into an aggregated report document",
    version
)]
struct Cli {
    /// Google Ads CSV file path
    #[arg(long)]
    google: Option<PathBuf>,

    /// Meta (Facebook/Instagram) Ads CSV file path
    #[arg(long)]
    meta: Option<PathBuf>,

    /// Yahoo! Ads CSV file path
    #[arg(long)]
    yahoo: Option<PathBuf>,

    /// LINE Ads CSV file path
    #[arg(long)]
    line: Option<PathBuf>,

    /// Client display name; the stored name is only overwritten when given
    #[arg(long)]
    client: Option<String>,

    /// Client identifier
    #[arg(long, default_value = "client")]
    client_id: String,

    /// Output document path
    #[arg(long, short = 'o', default_value = "data.json")]
    output: PathBuf,

    /// Merge into the existing output document instead of rebuilding
    #[arg(long)]
    merge: bool,

    /// Column-mapping overrides (JSON: platform -> field -> candidate names)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Logging level (overridden by RUST_LOG when set)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let inputs: Vec<(&str, &PathBuf)> = [
        ("google", cli.google.as_ref()),
        ("meta", cli.meta.as_ref()),
        ("yahoo", cli.yahoo.as_ref()),
        ("line", cli.line.as_ref()),
    ]
    .into_iter()
    .filter_map(|(platform, path)| path.map(|p| (platform, p)))
    .collect();

    if inputs.is_empty() {
        bail!("specify at least one platform CSV (--google, --meta, --yahoo, --line)");
    }

    let mut maps = ColumnMaps::builtin();
    if let Some(config_path) = &cli.config {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file {}", config_path.display()))?;
        let overrides: ColumnOverrides = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", config_path.display()))?;
        maps = maps.with_overrides(overrides);
    }

    let prior = if cli.merge {
        match output::read_document(&cli.output) {
            Some(doc) => {
                tracing::info!("loaded existing document: {}", cli.output.display());
                Some(doc)
            }
            None => {
                if cli.output.exists() {
                    tracing::warn!(
                        "existing document is unreadable, rebuilding from scratch: {}",
                        cli.output.display()
                    );
                }
                None
            }
        }
    } else {
        None
    };

    let csv_loader = CsvLoader::new(maps);
    let mut all_records = Vec::new();
    for (platform, path) in inputs {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }
        let (records, report) = csv_loader
            .load_file(path, platform)
            .with_context(|| format!("failed to load {} export {}", platform, path.display()))?;
        tracing::info!(
            "{}: {} rows read, {} records ({})",
            platform,
            format_int(report.total_rows),
            format_int(report.records),
            path.display()
        );
        if report.skipped_totals > 0 {
            tracing::debug!(
                "{}: {} blank or grand-total rows skipped",
                platform,
                format_int(report.skipped_totals)
            );
        }
        if report.dropped_rows > 0 {
            tracing::warn!(
                "{}: {} rows dropped due to unparseable dates",
                platform,
                format_int(report.dropped_rows)
            );
        }
        all_records.extend(records);
    }

    if all_records.is_empty() {
        bail!("no usable records found in any input file");
    }

    let client = cli.client.as_ref().map(|name| ClientInfo {
        name: name.clone(),
        id: cli.client_id.clone(),
    });
    let doc = reports::build_document(&all_records, client, prior);

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    output::write_document(&cli.output, &doc)?;

    let preview: Vec<MonthPreviewRow> = doc
        .months
        .iter()
        .map(|(month, report)| MonthPreviewRow {
            month: month.clone(),
            cost: format_int(report.summary.cost),
            impressions: format_int(report.summary.impressions),
            clicks: format_int(report.summary.clicks),
            conversions: format_int(report.summary.conversions),
            ctr: format!("{:.2}", report.summary.ctr),
            cvr: format!("{:.2}", report.summary.cvr),
            cpc: format_int(report.summary.cpc),
            cpa: format_int(report.summary.cpa),
        })
        .collect();
    println!("Monthly summary:\n");
    output::preview_table_rows(&preview, 12);

    let total_weeks: usize = doc.months.values().map(|m| m.weeks.len()).sum();
    let platforms: BTreeSet<&str> = doc
        .months
        .values()
        .flat_map(|m| m.platforms.keys().map(String::as_str))
        .collect();
    let months: Vec<&str> = doc.months.keys().map(String::as_str).collect();

    println!("Report written to {}", cli.output.display());
    println!("  Client: {}", doc.client.name);
    println!("  Months: {}", months.join(", "));
    println!("  Weeks: {}", format_int(total_weeks));
    println!(
        "  Platforms: {}",
        platforms.into_iter().collect::<Vec<_>>().join(", ")
    );
    println!("  Records: {}", format_int(all_records.len()));

    Ok(())
}
