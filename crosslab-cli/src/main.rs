//! CrossLab CLI: crossover signals, data download, and cache inspection.
//!
//! Commands:
//! - `signals`: compute Buy/Sell/Hold signals for one symbol and print or export them
//! - `download`: fetch daily bars from Yahoo Finance into the Parquet cache
//! - `cache status`: report cached symbols, date ranges and sizes

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crosslab_core::config::{parse_date, DataSourceKind, OutputFormat, DEFAULT_CACHE_DIR};
use crosslab_core::data::{
    download_symbols, open_loader, CircuitBreaker, LogProgress, ParquetCache, YahooLoader,
};
use crosslab_core::export::{
    write_signals_csv, write_signals_csv_file, write_signals_json, write_signals_json_file,
};
use crosslab_core::{pipeline, CrosslabConfig, SignalReport};

#[derive(Parser)]
#[command(
    name = "crosslab",
    version,
    about = "CrossLab CLI: moving-average crossover signals over daily OHLCV data"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Logs go to stderr.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute crossover signals for a symbol.
    Signals(SignalsArgs),
    /// Download market data from Yahoo Finance and cache as Parquet.
    Download {
        /// Symbols to download (e.g., WIPRO.NS INFY.NS).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory.
        #[arg(long, default_value = DEFAULT_CACHE_DIR)]
        cache_dir: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached date ranges and sizes. Lists every cached symbol when none are given.
    Status {
        symbols: Vec<String>,

        /// Cache directory.
        #[arg(long, default_value = DEFAULT_CACHE_DIR)]
        cache_dir: PathBuf,
    },
}

/// Flags override values from `--config`; anything unset falls back to defaults.
#[derive(Args)]
struct SignalsArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    symbol: Option<String>,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,

    /// Short moving-average window (1-100).
    #[arg(long)]
    short: Option<usize>,

    /// Long moving-average window (1-200).
    #[arg(long)]
    long: Option<usize>,

    /// Data source: yahoo, csv or synthetic.
    #[arg(long)]
    source: Option<DataSourceKind>,

    /// CSV file to read (implies --source csv).
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Serve from the cache only; no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Output format: table, csv or json.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Write output here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Signals(args) => run_signals(args),
        Commands::Download {
            symbols,
            start,
            end,
            force,
            cache_dir,
        } => run_download(symbols, start, end, force, cache_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status { symbols, cache_dir } => run_cache_status(&symbols, &cache_dir),
        },
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::prelude::*;

    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("crosslab_core", level)
                .with_target("crosslab", level)
                .with_default(tracing::Level::WARN),
        );
    tracing_subscriber::registry().with(fmt_layer).init();
}

fn build_config(args: &SignalsArgs) -> Result<CrosslabConfig> {
    let mut config = match &args.config {
        Some(path) => CrosslabConfig::from_file(path)?,
        None => CrosslabConfig::default(),
    };

    if let Some(symbol) = &args.symbol {
        config.signal.symbol = symbol.clone();
    }
    if let Some(start) = &args.start {
        config.signal.start_date = parse_date(start)?;
    }
    if let Some(end) = &args.end {
        config.signal.end_date = parse_date(end)?;
    }
    if let Some(short) = args.short {
        config.signal.short_window = short;
    }
    if let Some(long) = args.long {
        config.signal.long_window = long;
    }
    if let Some(path) = &args.csv {
        config.data.source = DataSourceKind::Csv;
        config.data.csv_path = Some(path.clone());
    }
    if let Some(source) = args.source {
        config.data.source = source;
    }
    if args.offline {
        config.data.offline = true;
    }
    if let Some(dir) = &args.cache_dir {
        config.data.cache_dir = dir.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(path) = &args.output {
        config.output.path = Some(path.clone());
    }
    Ok(config)
}

fn run_signals(args: SignalsArgs) -> Result<()> {
    let config = build_config(&args)?;
    let request = config.validate()?;
    let loader = open_loader(&config.data)?;

    let report = match pipeline::run_padded(
        loader.as_ref(),
        &request,
        config.data.history_padding_days,
    ) {
        Ok(report) => report,
        Err(e) => bail!("[{}] {e}", e.category()),
    };

    match &config.output.path {
        Some(path) => {
            write_report_file(&report, config.output.format, path)?;
            println!("Signals written to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            match config.output.format {
                OutputFormat::Table => stdout.write_all(render_table(&report).as_bytes())?,
                OutputFormat::Csv => write_signals_csv(&mut stdout, &report)?,
                OutputFormat::Json => write_signals_json(&mut stdout, &report)?,
            }
        }
    }
    Ok(())
}

fn write_report_file(report: &SignalReport, format: OutputFormat, path: &Path) -> Result<()> {
    match format {
        OutputFormat::Table => std::fs::write(path, render_table(report))
            .with_context(|| format!("failed to write {}", path.display()))?,
        OutputFormat::Csv => write_signals_csv_file(path, report)?,
        OutputFormat::Json => write_signals_json_file(path, report)?,
    }
    Ok(())
}

fn render_table(report: &SignalReport) -> String {
    let params = report.params();
    let short_header = format!("Short MA({})", params.short_window);
    let long_header = format!("Long MA({})", params.long_window);

    let mut s = String::new();
    let (start, end) = report.visible_range();
    let _ = writeln!(s, "=== {} crossover signals ===", report.symbol());
    let _ = writeln!(s, "Period: {start} to {end}");
    let _ = writeln!(s);
    let _ = writeln!(
        s,
        "{:<10} {:>12} {:>14} {:>14} {:>6}",
        "Date", "Close", short_header, long_header, "Signal"
    );
    let _ = writeln!(s, "{}", "-".repeat(60));
    for (row, signal) in report.visible_rows() {
        let _ = writeln!(
            s,
            "{:<10} {:>12.2} {:>14.4} {:>14.4} {:>6}",
            row.bar.date,
            row.bar.close,
            row.short_ma,
            row.long_ma,
            signal.label()
        );
    }

    let summary = report.summary();
    let _ = writeln!(s);
    let _ = write!(
        s,
        "{} bars: {} buy, {} sell, {} hold",
        summary.bars, summary.buy, summary.sell, summary.hold
    );
    if let (Some(last), Some(date)) = (summary.last, summary.last_date) {
        let _ = write!(s, " | last: {} on {date}", last.label());
    }
    let _ = writeln!(s);
    s
}

fn run_download(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    cache_dir: PathBuf,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let start_date = match start.as_deref() {
        Some(s) => parse_date(s)?,
        None => today - chrono::Duration::days(365 * 10),
    };
    let end_date: NaiveDate = match end.as_deref() {
        Some(s) => parse_date(s)?,
        None => today,
    };
    if start_date > end_date {
        bail!("start date {start_date} is after end date {end_date}");
    }

    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let loader = YahooLoader::new(circuit_breaker)?;
    let cache = ParquetCache::new(cache_dir);

    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();

    let summary = download_symbols(
        &loader,
        &cache,
        &sym_refs,
        start_date,
        end_date,
        force,
        &LogProgress,
    );

    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        bail!("{} of {} downloads failed", summary.failed, summary.total);
    }

    println!(
        "Downloaded {}/{} symbol(s) into {}",
        summary.succeeded,
        summary.total,
        cache.cache_dir().display()
    );
    Ok(())
}

fn run_cache_status(symbols: &[String], cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let symbols: Vec<String> = if symbols.is_empty() {
        cached_symbols(cache_dir)?
    } else {
        symbols.to_vec()
    };

    if symbols.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ParquetCache::new(cache_dir);
    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    let statuses = cache.status(&sym_refs);

    let mut total_size: u64 = 0;
    println!("Cache: {}", cache_dir.display());
    println!();
    println!("{:<12} {:<25} {:<12} {:>10}", "Symbol", "Date Range", "Bars", "Size");
    println!("{}", "-".repeat(62));
    for status in &statuses {
        let size = dir_size(&cache_dir.join(format!("symbol={}", status.symbol)));
        total_size += size;
        let (range, bars) = match (status.start_date, status.end_date, status.bar_count) {
            (Some(start), Some(end), Some(count)) => {
                (format!("{start} to {end}"), format!("{count} bars"))
            }
            _ => ("(not cached)".to_string(), "-".to_string()),
        };
        println!(
            "{:<12} {:<25} {:<12} {:>10}",
            status.symbol,
            range,
            bars,
            format_size(size)
        );
    }
    println!();
    println!(
        "{} of {} cached, total size {}",
        statuses.iter().filter(|s| s.cached).count(),
        statuses.len(),
        format_size(total_size)
    );

    Ok(())
}

fn cached_symbols(cache_dir: &Path) -> Result<Vec<String>> {
    let mut symbols = Vec::new();
    for entry in std::fs::read_dir(cache_dir)? {
        let name = entry?.file_name().to_string_lossy().to_string();
        if let Some(symbol) = name.strip_prefix("symbol=") {
            symbols.push(symbol.to_string());
        }
    }
    symbols.sort();
    Ok(symbols)
}

fn dir_size(path: &Path) -> u64 {
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                size += meta.len();
            }
        }
    }
    size
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
