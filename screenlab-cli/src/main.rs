//! Screenlab CLI: indicator, signal and screener commands.
//!
//! Commands:
//! - `indicators <csv>`: SMA20/EMA50/RSI14 summary of a bar file
//! - `signals <SYMBOL>`: signals firing at the latest bar
//! - `screen`: rank symbols or baskets against a filter set
//! - `universe`: list the configured baskets
//!
//! Results are printed to stdout as JSON; logs go to stderr.

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use screenlab_core::{compute_indicators, generate_signals, FilterId};
use screenlab_runner::{
    build_source, read_bars_csv, BarSource, ConfidenceMode, ScreenerConfig, Screener,
    SourceKind,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "screenlab",
    about = "Screenlab CLI: technical indicators, signals and stock screening"
)]
struct Cli {
    /// Emit logs as JSON (also SCREENLAB_LOG_FORMAT=json).
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    /// Screener config file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where bars come from; overrides `[source]` in the config.
#[derive(clap::Args, Debug, Default)]
struct SourceArgs {
    /// Bar source: csv, yahoo or synthetic.
    #[arg(long)]
    source: Option<SourceKind>,

    /// Directory of `{SYMBOL}.csv` files.
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize SMA20, EMA50 and RSI14 for a CSV bar file.
    Indicators {
        /// CSV with header timestamp,open,high,low,close,volume.
        csv: PathBuf,
    },
    /// Generate the signals firing at the latest bar of one symbol.
    Signals {
        symbol: String,

        /// Trailing daily bars to fetch.
        #[arg(long)]
        bars: Option<usize>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Screen symbols and baskets against a filter set.
    Screen {
        /// Tickers or basket codes (comma separated or repeated).
        #[arg(long, required = true, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Filters, e.g. rsiOversold,macdBullish.
        #[arg(long, required = true, value_delimiter = ',')]
        filters: Vec<FilterId>,

        /// Require two indicator families to agree on a direction.
        #[arg(long, default_value_t = false)]
        two_plus: bool,

        /// Minimum confidence in [0, 1].
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Require agreement on weekly bars as well.
        #[arg(long, default_value_t = false)]
        weekly: bool,

        /// Confidence mode: simple or family-weighted.
        #[arg(long)]
        confidence_mode: Option<ConfidenceMode>,

        /// Trailing daily bars to fetch per symbol.
        #[arg(long)]
        daily_bars: Option<usize>,

        /// Worker threads.
        #[arg(long)]
        threads: Option<usize>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// List the basket codes and their members.
    Universe,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Indicators { csv } => run_indicators(&csv),
        Commands::Signals {
            symbol,
            bars,
            source,
        } => {
            apply_source_args(&mut config, source);
            run_signals(&config, &symbol, bars)
        }
        Commands::Screen {
            symbols,
            filters,
            two_plus,
            min_confidence,
            weekly,
            confidence_mode,
            daily_bars,
            threads,
            source,
        } => {
            apply_source_args(&mut config, source);
            let opts = &mut config.options;
            opts.require_two_plus |= two_plus;
            opts.require_weekly_agree |= weekly;
            if let Some(min) = min_confidence {
                opts.min_confidence = min;
            }
            if let Some(mode) = confidence_mode {
                opts.confidence_mode = mode;
            }
            if let Some(n) = daily_bars {
                opts.daily_bars = n;
            }
            if threads.is_some() {
                config.threads = threads;
            }
            config.validate().context("invalid screener options")?;
            run_screen(&config, &symbols, &filters)
        }
        Commands::Universe => print_json(&config.universe()),
    }
}

fn load_config(path: Option<&Path>) -> Result<ScreenerConfig> {
    match path {
        Some(path) => ScreenerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ScreenerConfig::default()),
    }
}

fn apply_source_args(config: &mut ScreenerConfig, args: SourceArgs) {
    if let Some(kind) = args.source {
        config.source.kind = kind;
    }
    if args.csv_dir.is_some() {
        config.source.csv_dir = args.csv_dir;
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn run_indicators(csv: &Path) -> Result<()> {
    let bars =
        read_bars_csv(csv).with_context(|| format!("failed to read bars from {}", csv.display()))?;
    if bars.is_empty() {
        bail!("{} contains no bars", csv.display());
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    tracing::info!(bars = bars.len(), file = %csv.display(), "computing indicators");
    print_json(&compute_indicators(&closes))
}

fn run_signals(config: &ScreenerConfig, symbol: &str, bars: Option<usize>) -> Result<()> {
    let symbol = symbol.trim().to_ascii_uppercase();
    let count = bars.unwrap_or(config.options.daily_bars);
    let source = build_source(config.source.kind, config.source.csv_dir.clone())
        .context("failed to build bar source")?;

    let bars = source
        .fetch_daily_bars(&symbol, count)
        .with_context(|| format!("failed to fetch bars for {symbol}"))?;
    let signals = generate_signals(&bars);
    tracing::info!(symbol = %symbol, bars = bars.len(), signals = signals.len(), "signals generated");

    print_json(&json!({
        "symbol": symbol,
        "source": source.name(),
        "bars": bars.len(),
        "price": bars.last().map(|b| b.close),
        "signals": signals,
    }))
}

fn run_screen(config: &ScreenerConfig, symbols: &[String], filters: &[FilterId]) -> Result<()> {
    let source = build_source(config.source.kind, config.source.csv_dir.clone())
        .context("failed to build bar source")?;

    let mut screener = Screener::new(source).with_universe(config.universe());
    if let Some(cache) = config.build_cache() {
        screener = screener.with_cache(Arc::new(cache));
    }
    if let Some(threads) = config.threads {
        screener = screener
            .with_threads(threads)
            .context("failed to start worker pool")?;
    }

    let rows = screener.run(symbols, filters, &config.options);
    print_json(&rows)
}
