//! CrossLab TUI: interactive crossover chart.
//!
//! Shows close, short MA and long MA for one symbol with Buy/Sell markers,
//! or the same range as candles with both averages (`c` switches). Two
//! sliders set the window lengths; every change re-runs the engine over the
//! series loaded at startup.

mod app;
mod candles;
mod chart;
mod input;
mod theme;
mod ui;

use std::fs::File;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crosslab_core::config::{parse_date, DataSourceKind};
use crosslab_core::data::open_loader;
use crosslab_core::{pipeline, CrosslabConfig, EngineError};

use crate::app::App;

#[derive(Parser)]
#[command(
    name = "crosslab-tui",
    version,
    about = "Interactive moving-average crossover chart"
)]
struct Args {
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

    /// Initial short window (1-100).
    #[arg(long)]
    short: Option<usize>,

    /// Initial long window (1-200).
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

    /// Append logs to this file. The terminal owns stdout and stderr, so
    /// nothing is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_tracing(path)?;
    }

    let config = build_config(&args)?;
    let request = config.validate()?;

    // A load failure is shown in the chart area rather than aborting.
    let loaded = open_loader(&config.data)
        .map_err(EngineError::from)
        .and_then(|loader| {
            pipeline::load_series(loader.as_ref(), &request, config.data.history_padding_days)
        });
    let mut app = App::new(request, loaded);

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|f| ui::draw(f, app))?;

        // 50ms poll keeps the loop responsive without spinning.
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }
    }
    Ok(())
}

fn init_tracing(path: &Path) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("crosslab_core", tracing::Level::DEBUG)
                .with_target("crosslab_tui", tracing::Level::DEBUG)
                .with_default(tracing::Level::WARN),
        );
    tracing_subscriber::registry().with(fmt_layer).init();
    Ok(())
}

fn build_config(args: &Args) -> Result<CrosslabConfig> {
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
    Ok(config)
}
