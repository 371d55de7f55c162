//! Reviewlens - review scraper and complaint analyzer
//!
//! A CLI tool that collects user reviews of meditation apps from
//! Trustpilot, the Apple App Store, and Google Play, persists them as CSV
//! snapshots, and buckets complaints into categories with keyword
//! heuristics, keeping billing gripes apart from product feedback.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, snapshot I/O, bad arguments)
//!   2 - No review data found for an analysis run

mod analysis;
mod classifier;
mod cli;
mod config;
mod csv;
mod dedup;
mod models;
mod report;
mod sources;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use classifier::{Classifier, PhraseMiner, RuleSet};
use cli::{AnalyzeArgs, Args, Command, ScrapeArgs};
use config::{AppEntry, Config};
use indicatif::ProgressBar;
use models::{Review, Source, TaggedReview};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Reviewlens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .reviewlens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".reviewlens.toml");

    if path.exists() {
        eprintln!("⚠️  .reviewlens.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .reviewlens.toml")?;

    println!("✅ Created .reviewlens.toml with default settings.");
    println!("   Edit it to customize sources, delays, billing rules, and the app registry.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the selected subcommand. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command {
        Command::Scrape(ref scrape) => {
            config.merge_scrape(scrape);
            run_scrape(scrape, &config).await
        }
        Command::Analyze(ref analyze) => {
            config.merge_analyze(analyze);
            run_analyze(analyze, &config)
        }
        // Handled before logging was set up.
        Command::InitConfig => Ok(0),
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .reviewlens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Run a scrape: every enabled source for every selected app, one source
/// at a time. A connector that stops early never aborts the run; its
/// partial results are kept and the next source proceeds.
async fn run_scrape(scrape: &ScrapeArgs, config: &Config) -> Result<i32> {
    let enabled: Vec<Source> = match &scrape.sources {
        Some(list) => list.iter().copied().map(Source::from).collect(),
        None => Source::all().to_vec(),
    };

    let targets: Vec<&AppEntry> = match &scrape.company {
        Some(name) => {
            let matched: Vec<&AppEntry> = config
                .apps
                .iter()
                .filter(|app| app.company.eq_ignore_ascii_case(name))
                .collect();
            if matched.is_empty() {
                anyhow::bail!("No app named {:?} in the registry", name);
            }
            matched
        }
        None => config.apps.iter().collect(),
    };

    let client = sources::build_http_client(&config.scrape);
    let connectors = sources::build_connectors(&client, &config.scrape, &enabled);

    let mut collected: Vec<Review> = Vec::new();
    for app in &targets {
        println!("\n📥 Scraping {}", app.company);

        for connector in &connectors {
            let spinner = ProgressBar::new_spinner();
            spinner.set_message(format!("{}: fetching pages...", connector.source()));
            spinner.enable_steady_tick(Duration::from_millis(120));

            let outcome = connector.scrape(app).await;
            spinner.finish_and_clear();

            if outcome.stop.is_error() {
                warn!(
                    "{} / {}: stopped after {} pages ({})",
                    app.company,
                    connector.source(),
                    outcome.pages_fetched,
                    outcome.stop
                );
            } else {
                info!(
                    "{} / {}: {} pages ({})",
                    app.company,
                    connector.source(),
                    outcome.pages_fetched,
                    outcome.stop
                );
            }
            println!(
                "   {}: {} reviews from {} pages ({})",
                connector.source(),
                outcome.reviews.len(),
                outcome.pages_fetched,
                outcome.stop
            );

            collected.extend(outcome.reviews);
        }
    }

    let (unique, removed) = dedup::dedup_reviews(collected);
    if removed > 0 {
        println!("\nRemoved {} duplicate reviews", removed);
    }

    if unique.is_empty() {
        println!("\nNo reviews collected, nothing to save.");
        return Ok(0);
    }

    let path = match &scrape.output {
        Some(path) => path.clone(),
        None => PathBuf::from(&config.general.data_dir).join(store::snapshot_filename(Utc::now())),
    };
    store::write_snapshot(&path, &unique)?;
    println!("\n💾 Saved {} reviews to {}", unique.len(), path.display());

    println!("\n{}", report::scrape_summary(&unique));
    Ok(0)
}

/// Run an analysis over the latest (or a named) snapshot.
fn run_analyze(analyze: &AnalyzeArgs, config: &Config) -> Result<i32> {
    let data_dir = PathBuf::from(&config.general.data_dir);

    let path = match &analyze.input {
        Some(path) => path.clone(),
        None => match store::latest_snapshot(&data_dir)? {
            Some(path) => path,
            None => {
                eprintln!("No review snapshots found in {}", data_dir.display());
                return Ok(2);
            }
        },
    };

    let reviews = store::read_snapshot(&path)?;
    if reviews.is_empty() {
        eprintln!("Snapshot {} holds no reviews", path.display());
        return Ok(2);
    }

    println!("📊 Analyzing {} reviews from {}\n", reviews.len(), path.display());

    let classifier = Classifier::new(RuleSet::builtin(), config.classifier.billing());
    let miner = PhraseMiner::builtin();

    let tagged: Vec<TaggedReview> = reviews
        .into_iter()
        .map(|review| {
            let classification = classifier.classify(&review.text);
            TaggedReview {
                review,
                tags: classification.tags,
                billing_dominant: classification.billing_dominant,
            }
        })
        .collect();

    println!(
        "{}",
        report::analysis_report(&tagged, classifier.rules(), &miner, &config.report)
    );
    Ok(0)
}
