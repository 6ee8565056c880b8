//! geohash-bot - daily geohash acquisition and watcher notification
//!
//! Subcommands:
//! - `run`: wait for the market open to be agreed, derive the day's
//!   coordinates and append a section for every watched centicule hit
//! - `compute`: derive one coordinate from a given value
//! - `sources`: query every source once and show what they report
//! - `init-config`: write the resolved configuration to a file

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use clap::{Args, Parser, Subcommand};
use geohash_common::config::{
    default_config_path, init_config_file, ConfigResolver, LoggingConfig, TomlConfig,
};
use geohash_common::time::{self, parse_iso_date, prior_day_rule_cutoff};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use geohash_bot::consensus::{tally, ConsensusResolver};
use geohash_bot::geohash::{self as deriver, Graticule};
use geohash_bot::notify::{needs_same_day_value, plan_notifications, render_sections};
use geohash_bot::poller::{poll_for_date, PollSettings};
use geohash_bot::sources::build_sources;
use geohash_bot::{ConsensusMap, WatchList};

/// Command-line arguments for geohash-bot
#[derive(Parser, Debug)]
#[command(name = "geohash-bot")]
#[command(about = "Daily geohash acquisition and watcher notification")]
#[command(version)]
struct Cli {
    /// Config file (overrides GEOHASH_CONFIG and the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Acquire the day's value and notify matching watchers
    Run(RunArgs),
    /// Derive a single coordinate from a known value
    Compute(ComputeArgs),
    /// Fetch every source once and print observations and consensus
    Sources(SourcesArgs),
    /// Write the resolved configuration as a config file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Expedition date, YYYY-MM-DD (defaults to the current market day)
    #[arg(long, value_parser = parse_iso_date)]
    date: Option<NaiveDate>,

    /// Watcher table file (overrides [watchers] file)
    #[arg(long, env = "GEOHASH_WATCHERS")]
    watchers: Option<PathBuf>,

    /// Page file to append sections to (overrides [output] page)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Resolve once instead of polling until the value appears
    #[arg(long)]
    once: bool,
}

#[derive(Args, Debug)]
struct ComputeArgs {
    /// Expedition date, YYYY-MM-DD
    #[arg(long, value_parser = parse_iso_date)]
    date: NaiveDate,

    /// Market open to hash
    #[arg(long, conflicts_with = "values", required_unless_present = "values")]
    dow: Option<String>,

    /// JSON object of date -> agreed value, searched with lookback
    #[arg(long, value_name = "FILE")]
    values: Option<PathBuf>,

    /// Apply the prior-day rule regardless of graticule
    #[arg(long)]
    prior_day: bool,

    /// Graticule as "lat,long"; selects the rule and prints a map link
    #[arg(long, allow_hyphen_values = true)]
    graticule: Option<Graticule>,
}

#[derive(Args, Debug)]
struct SourcesArgs {
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct InitConfigArgs {
    /// Target file (defaults to --config, then the user config path)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Replace an existing file
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigResolver::new(cli.config.clone())
        .load()
        .context("Failed to load configuration")?;

    init_tracing(&config.logging, cli.verbose)?;

    info!(
        "Starting geohash-bot v{} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );

    match cli.command {
        Command::Run(args) => run(&config, args).await,
        Command::Compute(args) => compute(args),
        Command::Sources(args) => sources(&config, args).await,
        Command::InitConfig(args) => init_config(&config, cli.config, args),
    }
}

/// RUST_LOG wins; otherwise the configured level (debug with --verbose)
fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let fallback = if verbose {
        "debug"
    } else {
        logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .with_context(|| format!("Invalid log level '{}'", fallback))?;

    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

async fn run(config: &TomlConfig, args: RunArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(|| time::market_today(time::now()));

    let watchers_path = args
        .watchers
        .or_else(|| config.watchers.file.clone())
        .context("No watcher table given (use --watchers or [watchers] file)")?;
    let table = fs::read_to_string(&watchers_path)
        .with_context(|| format!("Failed to read watcher table {}", watchers_path.display()))?;
    let watchlist = WatchList::parse(&table);

    if watchlist.for_day(date.weekday()).is_none() {
        info!("No watchers for {} ({}), nothing to do", date, date.weekday());
        return Ok(());
    }

    let resolver = ConsensusResolver::new(build_sources(&config.sources)?);
    info!("Querying sources: {}", resolver.source_ids().join(", "));

    let consensus = if args.once || !needs_same_day_value(&watchlist, date) {
        // Prior-day graticules only need values that are already published
        resolver.resolve().await
    } else {
        let outcome = poll_for_date(&resolver, date, PollSettings::from(&config.polling)).await;
        debug!("Polling finished after {} attempt(s)", outcome.attempts);
        outcome.consensus
    };

    let notifications = plan_notifications(&watchlist, date, &consensus);
    if notifications.is_empty() {
        info!("No watched centicules hit on {}", date);
        return Ok(());
    }

    for notification in &notifications {
        let external = notification.external_channels();
        if !external.is_empty() {
            // Delivery on these channels is handled outside this process
            info!(
                "Pending {} notification for {} centicule {}",
                external.join("+"),
                notification.graticule,
                notification.geohash.centicule
            );
        }
    }

    let text = render_sections(&notifications, &config.output.edit_url_base);
    match args.output.as_deref().or(config.output.page.as_deref()) {
        Some(page) => {
            append_to_page(page, &text)?;
            info!(
                "Appended {} section(s) to {}",
                notifications.len(),
                page.display()
            );
        }
        None => print!("{}", text),
    }

    Ok(())
}

fn append_to_page(page: &Path, text: &str) -> Result<()> {
    if let Some(parent) = page.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(page)
        .with_context(|| format!("Failed to open page {}", page.display()))?;
    writeln!(file, "{}", text)
        .with_context(|| format!("Failed to write page {}", page.display()))?;
    Ok(())
}

fn compute(args: ComputeArgs) -> Result<()> {
    let use_rule = args.prior_day
        || args
            .graticule
            .map(|g| g.uses_prior_day_rule())
            .unwrap_or(false);

    let geohash = match (&args.dow, &args.values) {
        (Some(value), _) => {
            let value_date = if use_rule && args.date >= prior_day_rule_cutoff() {
                args.date - Duration::days(1)
            } else {
                args.date
            };
            deriver::compute(args.date, value_date, value)?
        }
        (None, Some(path)) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let consensus: ConsensusMap = serde_json::from_str(&content)
                .with_context(|| format!("Invalid values file {}", path.display()))?;
            deriver::derive(&consensus, args.date, use_rule)?
        }
        (None, None) => bail!("Either --dow or --values is required"),
    };

    println!("date:       {}", geohash.date);
    println!("value:      {} ({})", geohash.value, geohash.value_date);
    println!("latitude:   0.{}", geohash.latitude);
    println!("longitude:  0.{}", geohash.longitude);
    println!("centicule:  {}", geohash.centicule);
    if let Some(graticule) = args.graticule {
        println!("map:        {}", geohash.map_url(graticule));
    }

    Ok(())
}

async fn sources(config: &TomlConfig, args: SourcesArgs) -> Result<()> {
    let resolver = ConsensusResolver::new(build_sources(&config.sources)?);
    let observations = resolver.collect().await;
    let consensus = tally(&observations);

    if observations.is_empty() {
        warn!("No source returned any observation");
    }

    if args.json {
        let report = serde_json::json!({
            "observations": observations,
            "consensus": consensus,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for observation in &observations {
        println!(
            "{:<18} {}  {}",
            observation.source,
            observation.date,
            observation.value
        );
    }
    println!();
    for (date, value) in consensus.iter() {
        println!("agreed  {}  {}", date, value);
    }

    Ok(())
}

fn init_config(
    config: &TomlConfig,
    cli_path: Option<PathBuf>,
    args: InitConfigArgs,
) -> Result<()> {
    let target = args
        .path
        .or(cli_path)
        .or_else(default_config_path)
        .context("No target path (use --path)")?;

    init_config_file(config, &target, args.force)?;
    println!("{}", target.display());
    Ok(())
}
