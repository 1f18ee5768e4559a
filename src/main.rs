//! weblog-stats CLI - Summarize traffic from a web server access log.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weblog_stats::{
    HourOrder, HourSource, OutputFormat, Report, analyze, config::Config,
};

/// weblog-stats - Summarize traffic from a web server access log
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Access log to analyze (defaults to the configured log file)
    log_file: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Order of the hourly trend listing
    #[arg(long, value_enum)]
    hour_order: Option<HourOrder>,

    /// Bucket hours in UTC using each line's zone offset
    #[arg(long)]
    utc: bool,

    /// Only list the N most visited pages
    #[arg(short, long)]
    top: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the report
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    apply_overrides(&mut config, &args);
    config.validate()?;

    info!("Analyzing {}", config.log_file.display());

    let content = fs::read_to_string(&config.log_file)
        .with_context(|| format!("Failed to read log file: {}", config.log_file.display()))?;

    let aggregator = analyze(&content, config.hour_source);
    let report = Report::new(aggregator.snapshot(), config.report_options());
    let output = report
        .render(config.format)
        .context("Failed to render report")?;

    print!("{}", output);
    if config.format == OutputFormat::Json {
        println!();
    }

    Ok(())
}

/// Command-line arguments take precedence over the config file.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(path) = &args.log_file {
        config.log_file = path.clone();
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(order) = args.hour_order {
        config.hour_order = order;
    }
    if args.utc {
        config.hour_source = HourSource::Utc;
    }
    if args.top.is_some() {
        config.top_pages = args.top;
    }
}
