//! Decorr CLI: fetch, run, and universe commands.
//!
//! Commands:
//! - `fetch`: fetch the universe and its price series, save them as a snapshot
//! - `run`: full selection run (live, from a snapshot, or on synthetic data)
//! - `universe`: print the market-cap filtered universe

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use decorr_core::data::{
    CircuitBreaker, CoinGeckoProvider, Lenient, MarketDataProvider, SeriesSource,
    SyntheticProvider, UniverseFile, UniverseSource,
};
use decorr_core::domain::Universe;
use decorr_runner::config::{PacingMode, StrategyKind, UniverseKind};
use decorr_runner::sink::SNAPSHOT_FILE;
use decorr_runner::{
    fetch_all, init_logging, run_pipeline, sinks_for, DataOrigin, LogConfig, LogFormat,
    LogProgress, PacingPolicy, PipelineOptions, RunConfig, SeriesSnapshot,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "decorr",
    about = "Decorr CLI: find low-correlation crypto assets"
)]
struct Cli {
    /// Log output format: pretty, compact, or json.
    #[arg(long, global = true, default_value = "compact")]
    log_format: LogFormat,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the universe and its price series and save them as a snapshot.
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Snapshot path. Defaults to <output dir>/data.json.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run a selection strategy over live, snapshot, or synthetic data.
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Replay a saved snapshot instead of fetching (no network access).
        #[arg(long, conflicts_with = "synthetic")]
        snapshot: Option<PathBuf>,

        /// Use deterministic synthetic series (developer mode, tagged in the report).
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Selection strategy.
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Number of pairs kept by top-k.
        #[arg(long)]
        k: Option<usize>,

        /// Number of assets greedy tries to select.
        #[arg(long, allow_negative_numbers = true)]
        target_size: Option<i64>,

        /// Greedy acceptance threshold on |correlation| (strict).
        #[arg(long)]
        threshold: Option<f64>,

        /// Output directory for selection.json, pairs.csv, and data.json.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Do not write a data.json snapshot of the fetched series.
        #[arg(long, default_value_t = false)]
        no_snapshot: bool,

        /// Fail when no series could be fetched at all.
        #[arg(long, default_value_t = false)]
        require_data: bool,
    },
    /// Print the market-cap filtered universe.
    Universe {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Lower market-cap bound (exclusive).
        #[arg(long)]
        min_market_cap: Option<f64>,

        /// Upper market-cap bound (exclusive).
        #[arg(long)]
        max_market_cap: Option<f64>,

        /// Write the universe to a TOML universe file.
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

/// Options shared by commands that fetch series.
#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Static universe (asset ids in priority order) instead of the CoinGecko markets list.
    #[arg(long, num_args = 1..)]
    assets: Vec<String>,

    /// Static universe from a TOML universe file.
    #[arg(long)]
    universe_file: Option<PathBuf>,

    /// Trailing window length in days.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    days: Option<u32>,

    /// Window start (unix seconds).
    #[arg(long, requires = "end")]
    start: Option<i64>,

    /// Window end (unix seconds).
    #[arg(long, requires = "start")]
    end: Option<i64>,

    /// Delay between fetch starts in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Fetch one asset at a time instead of staggering concurrent fetches.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    TopK,
    Greedy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::new(&cli.log_level).with_format(cli.log_format))?;

    match cli.command {
        Commands::Fetch { source, out } => run_fetch(&source, out),
        Commands::Run {
            source,
            snapshot,
            synthetic,
            strategy,
            k,
            target_size,
            threshold,
            output_dir,
            no_snapshot,
            require_data,
        } => {
            let mut config = load_config(&source)?;
            if let Some(s) = strategy {
                config.strategy.kind = match s {
                    StrategyArg::TopK => StrategyKind::TopK,
                    StrategyArg::Greedy => StrategyKind::Greedy,
                };
            }
            if let Some(k) = k {
                config.strategy.k = k;
            }
            if let Some(t) = target_size {
                config.strategy.target_size = t;
            }
            if let Some(t) = threshold {
                config.strategy.threshold = t;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if no_snapshot {
                config.output.snapshot = false;
            }
            config.require_data |= require_data;
            config.validate()?;

            run_selection(&config, snapshot.as_deref(), synthetic)
        }
        Commands::Universe {
            config,
            min_market_cap,
            max_market_cap,
            save,
        } => run_universe(config.as_deref(), min_market_cap, max_market_cap, save),
    }
}

/// Config file (or defaults) with the shared source flags applied. Not yet validated.
fn load_config(args: &SourceArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };

    if !args.assets.is_empty() || args.universe_file.is_some() {
        config.universe.source = UniverseKind::Static;
        config.universe.assets = args.assets.clone();
        config.universe.file = args.universe_file.clone();
    }
    if let Some(days) = args.days {
        config.window.days = days;
        config.window.start = None;
        config.window.end = None;
    }
    if args.start.is_some() || args.end.is_some() {
        config.window.start = args.start;
        config.window.end = args.end;
    }
    if let Some(ms) = args.delay_ms {
        config.pacing.delay_ms = ms;
    }
    if args.sequential {
        config.pacing.mode = PacingMode::Sequential;
    }
    Ok(config)
}

fn live_provider(config: &RunConfig) -> Result<CoinGeckoProvider> {
    let breaker = Arc::new(CircuitBreaker::default_provider());
    Ok(CoinGeckoProvider::new(config.universe.coingecko(), breaker)?)
}

fn run_fetch(args: &SourceArgs, out: Option<PathBuf>) -> Result<()> {
    let config = load_config(args)?;
    config.validate()?;
    let window = config.window.resolve(Utc::now())?;
    let out = out.unwrap_or_else(|| config.output.dir.join(SNAPSHOT_FILE));

    let source = Lenient::new(live_provider(&config)?);
    let universe = match config.universe.source {
        UniverseKind::Static => config.universe.static_universe()?,
        UniverseKind::Coingecko => source.universe(),
    };
    if universe.is_empty() {
        bail!("universe is empty, nothing to fetch");
    }
    println!(
        "Fetching {} assets from {} to {}",
        universe.len(),
        window.start.format("%Y-%m-%d %H:%M"),
        window.end.format("%Y-%m-%d %H:%M")
    );

    let (series, summary) = fetch_all(
        universe.assets(),
        &window,
        &source,
        config.pacing_policy(),
        &LogProgress,
    );

    let snapshot = SeriesSnapshot::capture(universe.assets(), &series, window);
    snapshot
        .save(&out)
        .with_context(|| format!("failed to write snapshot {}", out.display()))?;

    println!(
        "Fetched {}/{} series, snapshot saved to: {}",
        summary.with_data,
        summary.total,
        out.display()
    );
    for asset in &summary.empty {
        eprintln!("No data for {asset}");
    }
    if !summary.any_data() {
        bail!("no series could be fetched");
    }
    Ok(())
}

fn run_selection(config: &RunConfig, snapshot: Option<&Path>, synthetic: bool) -> Result<()> {
    let sinks = sinks_for(&config.output);
    let snapshot_path = config
        .output
        .snapshot
        .then(|| config.output.dir.join(SNAPSHOT_FILE));

    let mut opts = PipelineOptions {
        window: config.window.resolve(Utc::now())?,
        pacing: config.pacing_policy(),
        strategy: config.selection_strategy(),
        origin: DataOrigin::Live,
        require_data: config.require_data,
        snapshot_path,
    };

    let run = |universe: &dyn UniverseSource, series: &dyn SeriesSource, opts: &PipelineOptions| {
        run_pipeline(universe, series, opts, &LogProgress, &sinks)
    };

    let output = if let Some(path) = snapshot {
        let snap = SeriesSnapshot::load(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?;
        opts.window = snap.window;
        opts.pacing = PacingPolicy::immediate();
        opts.origin = DataOrigin::Snapshot;
        opts.snapshot_path = None;
        run(&snap.universe(), &snap.to_series_set(), &opts)?
    } else if synthetic {
        tracing::warn!("using synthetic series, results are not market data");
        let universe = match config.universe.source {
            UniverseKind::Static => config.universe.static_universe()?,
            UniverseKind::Coingecko => UniverseFile::default_crypto().to_universe(),
        };
        opts.pacing = PacingPolicy::immediate();
        opts.origin = DataOrigin::Synthetic;
        let source = Lenient::new(SyntheticProvider::new(universe.clone()));
        run(&universe, &source, &opts)?
    } else {
        let source = Lenient::new(live_provider(config)?);
        match config.universe.source {
            UniverseKind::Static => run(&config.universe.static_universe()?, &source, &opts)?,
            UniverseKind::Coingecko => run(&source, &source, &opts)?,
        }
    };

    if output.report.universe.is_empty() {
        eprintln!("WARNING: universe was empty, no selection made");
    }
    if config.output.json || config.output.csv {
        println!("Artifacts saved to: {}", config.output.dir.display());
    }
    Ok(())
}

fn run_universe(
    config_path: Option<&Path>,
    min_market_cap: Option<f64>,
    max_market_cap: Option<f64>,
    save: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(min) = min_market_cap {
        config.universe.min_market_cap = min;
    }
    if let Some(max) = max_market_cap {
        config.universe.max_market_cap = max;
    }
    config.validate()?;

    let provider = live_provider(&config)?;
    let universe: Universe = provider.fetch_universe()?;

    println!(
        "{} assets with {} < market cap < {}:",
        universe.len(),
        config.universe.min_market_cap,
        config.universe.max_market_cap
    );
    for (i, asset) in universe.iter().enumerate() {
        println!("{:>4}. {asset}", i + 1);
    }

    if let Some(path) = save {
        let file = UniverseFile {
            assets: universe.iter().map(|a| a.to_string()).collect(),
        };
        std::fs::write(&path, file.to_toml()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Universe saved to: {}", path.display());
    }
    Ok(())
}
