//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::classifier::BillingCounting;
use crate::config::BillingRuleKind;
use crate::models::Source;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reviewlens - review scraper and complaint analyzer
///
/// Collects user reviews of meditation apps from Trustpilot, the Apple
/// App Store, and Google Play, then buckets complaints into categories
/// with keyword heuristics, separating billing gripes from product ones.
///
/// Examples:
///   reviewlens scrape
///   reviewlens scrape --sources trustpilot --company Calm
///   reviewlens analyze
///   reviewlens analyze --input data/reviews_20260801_090000.csv
///   reviewlens init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .reviewlens.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory snapshots are written to and read from
    #[arg(long, global = true, value_name = "DIR", env = "REVIEWLENS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scrape reviews from the configured sources into a CSV snapshot
    Scrape(ScrapeArgs),
    /// Classify and aggregate a snapshot, printing the report
    Analyze(AnalyzeArgs),
    /// Generate a default .reviewlens.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Sources to scrape (comma-separated)
    ///
    /// Example: --sources trustpilot,app-store. Default: all three.
    #[arg(long, value_name = "SOURCES", value_delimiter = ',')]
    pub sources: Option<Vec<SourceArg>>,

    /// Only scrape this company from the app registry
    #[arg(long, value_name = "NAME")]
    pub company: Option<String>,

    /// Delay between page requests, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Page cap for the App Store RSS feed
    #[arg(long, value_name = "PAGES")]
    pub max_pages: Option<u32>,

    /// Most-recent-review cap for Google Play
    #[arg(long, value_name = "COUNT")]
    pub play_cap: Option<usize>,

    /// Write the snapshot to this path instead of the data directory
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Analyze this snapshot instead of the latest one in the data directory
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Billing-dominance rule (term-count, comparative)
    #[arg(long, value_name = "RULE")]
    pub billing_rule: Option<BillingRuleArg>,

    /// Billing term threshold for the term-count rule
    #[arg(long, value_name = "N")]
    pub billing_threshold: Option<usize>,

    /// Billing-over-product margin for the comparative rule
    #[arg(long, value_name = "N")]
    pub billing_margin: Option<usize>,

    /// Term counting mode (distinct-terms, total-occurrences)
    #[arg(long, value_name = "MODE")]
    pub billing_counting: Option<CountingArg>,

    /// Categories shown per company section
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

/// Review source, as selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceArg {
    AppStore,
    GooglePlay,
    Trustpilot,
}

impl From<SourceArg> for Source {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::AppStore => Source::AppStore,
            SourceArg::GooglePlay => Source::GooglePlay,
            SourceArg::Trustpilot => Source::Trustpilot,
        }
    }
}

/// Billing-dominance rule, as selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BillingRuleArg {
    TermCount,
    Comparative,
}

impl From<BillingRuleArg> for BillingRuleKind {
    fn from(arg: BillingRuleArg) -> Self {
        match arg {
            BillingRuleArg::TermCount => BillingRuleKind::TermCount,
            BillingRuleArg::Comparative => BillingRuleKind::Comparative,
        }
    }
}

/// Term counting mode, as selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CountingArg {
    DistinctTerms,
    TotalOccurrences,
}

impl From<CountingArg> for BillingCounting {
    fn from(arg: CountingArg) -> Self {
        match arg {
            CountingArg::DistinctTerms => BillingCounting::DistinctTerms,
            CountingArg::TotalOccurrences => BillingCounting::TotalOccurrences,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Scrape(scrape) => {
                if let Some(sources) = &scrape.sources {
                    if sources.is_empty() {
                        return Err("--sources must name at least one source".to_string());
                    }
                }
                if let Some(max_pages) = scrape.max_pages {
                    if max_pages == 0 {
                        return Err("--max-pages must be at least 1".to_string());
                    }
                }
                if let Some(play_cap) = scrape.play_cap {
                    if play_cap == 0 {
                        return Err("--play-cap must be at least 1".to_string());
                    }
                }
                if let Some(company) = &scrape.company {
                    if company.trim().is_empty() {
                        return Err("--company must not be empty".to_string());
                    }
                }
            }
            Command::Analyze(analyze) => {
                if let Some(top) = analyze.top {
                    if top == 0 {
                        return Err("--top must be at least 1".to_string());
                    }
                }
                if let Some(ref input) = analyze.input {
                    if !input.is_file() {
                        return Err(format!("Input file does not exist: {}", input.display()));
                    }
                }
            }
            Command::InitConfig => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            data_dir: None,
            verbose: false,
            quiet: false,
        }
    }

    fn scrape_args() -> ScrapeArgs {
        ScrapeArgs {
            sources: None,
            company: None,
            delay_ms: None,
            max_pages: None,
            play_cap: None,
            output: None,
        }
    }

    #[test]
    fn test_validation_conflicting_verbosity() {
        let mut args = make_args(Command::Scrape(scrape_args()));
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_max_pages() {
        let mut scrape = scrape_args();
        scrape.max_pages = Some(0);
        let args = make_args(Command::Scrape(scrape));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_input_file() {
        let analyze = AnalyzeArgs {
            input: Some(PathBuf::from("/definitely/not/here.csv")),
            billing_rule: None,
            billing_threshold: None,
            billing_margin: None,
            billing_counting: None,
            top: None,
        };
        let args = make_args(Command::Analyze(analyze));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_source_arg_mapping() {
        assert_eq!(Source::from(SourceArg::AppStore), Source::AppStore);
        assert_eq!(Source::from(SourceArg::GooglePlay), Source::GooglePlay);
        assert_eq!(Source::from(SourceArg::Trustpilot), Source::Trustpilot);
    }
}
