//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.reviewlens.toml` files. Every knob the pipeline treats as policy
//! (polite delay, billing-dominance rule, report sizes, the app registry)
//! lives here rather than in code.

use crate::classifier::{BillingConfig, BillingCounting, BillingPolicy};
use crate::cli::{AnalyzeArgs, Args, ScrapeArgs};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scrape-run settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Apps to scrape, with their per-platform identifiers.
    #[serde(default = "default_apps")]
    pub apps: Vec<AppEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            scrape: ScrapeConfig::default(),
            classifier: ClassifierConfig::default(),
            report: ReportConfig::default(),
            apps: default_apps(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory snapshots are written to and read from.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            verbose: false,
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

/// Scrape-run settings shared by all connectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Store country code for App Store and Google Play.
    #[serde(default = "default_country")]
    pub country: String,

    /// Review language for Google Play.
    #[serde(default = "default_language")]
    pub language: String,

    /// Fixed delay between page requests, in milliseconds. Politeness
    /// toward the sources, not a correctness requirement.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-request timeout in seconds. A timeout ends that source's run.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Page cap for the App Store RSS feed (50 reviews per page, the feed
    /// serves at most 10 pages).
    #[serde(default = "default_app_store_max_pages")]
    pub app_store_max_pages: u32,

    /// Most-recent-review cap for Google Play.
    #[serde(default = "default_play_review_cap")]
    pub play_review_cap: usize,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            country: default_country(),
            language: default_language(),
            delay_ms: default_delay_ms(),
            timeout_seconds: default_timeout(),
            app_store_max_pages: default_app_store_max_pages(),
            play_review_cap: default_play_review_cap(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_country() -> String {
    "us".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_app_store_max_pages() -> u32 {
    10
}

fn default_play_review_cap() -> usize {
    500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

/// Which billing-dominance rule to apply. The source data carries both
/// rules; they are not interchangeable and neither is "the fixed version"
/// of the other, so the choice is explicit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BillingRuleKind {
    /// Billing term score strictly above `billing_threshold`.
    TermCount,
    /// Billing term score exceeds product term score by more than
    /// `billing_margin`.
    Comparative,
}

/// Classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_billing_rule")]
    pub billing_rule: BillingRuleKind,

    #[serde(default = "default_billing_threshold")]
    pub billing_threshold: usize,

    #[serde(default = "default_billing_margin")]
    pub billing_margin: usize,

    /// Whether term scores count distinct terms present or total
    /// occurrences.
    #[serde(default = "default_billing_counting")]
    pub billing_counting: BillingCounting,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            billing_rule: default_billing_rule(),
            billing_threshold: default_billing_threshold(),
            billing_margin: default_billing_margin(),
            billing_counting: default_billing_counting(),
        }
    }
}

fn default_billing_rule() -> BillingRuleKind {
    BillingRuleKind::TermCount
}

fn default_billing_threshold() -> usize {
    3
}

fn default_billing_margin() -> usize {
    2
}

fn default_billing_counting() -> BillingCounting {
    BillingCounting::DistinctTerms
}

impl ClassifierConfig {
    /// Build the billing signal configuration the classifier consumes.
    pub fn billing(&self) -> BillingConfig {
        let policy = match self.billing_rule {
            BillingRuleKind::TermCount => BillingPolicy::TermCountAbove(self.billing_threshold),
            BillingRuleKind::Comparative => {
                BillingPolicy::OutweighsProductBy(self.billing_margin)
            }
        };
        BillingConfig {
            counting: self.billing_counting,
            policy,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Categories shown per company section.
    #[serde(default = "default_top_categories")]
    pub top_categories: usize,

    /// Example excerpts retained per category.
    #[serde(default = "default_examples_per_category")]
    pub examples_per_category: usize,

    /// Extracted complaints shown per company.
    #[serde(default = "default_top_complaints")]
    pub top_complaints: usize,

    /// Extracted feature requests shown per company.
    #[serde(default = "default_top_requests")]
    pub top_requests: usize,

    /// Minimum mentions for a praised aspect to appear.
    #[serde(default = "default_min_praise_mentions")]
    pub min_praise_mentions: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_categories: default_top_categories(),
            examples_per_category: default_examples_per_category(),
            top_complaints: default_top_complaints(),
            top_requests: default_top_requests(),
            min_praise_mentions: default_min_praise_mentions(),
        }
    }
}

fn default_top_categories() -> usize {
    10
}

fn default_examples_per_category() -> usize {
    2
}

fn default_top_complaints() -> usize {
    15
}

fn default_top_requests() -> usize {
    15
}

fn default_min_praise_mentions() -> usize {
    3
}

/// One app to scrape: a company name plus its per-platform identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEntry {
    pub company: String,
    pub trustpilot_url: String,
    pub app_store_id: String,
    pub play_store_id: String,
}

fn default_apps() -> Vec<AppEntry> {
    vec![
        AppEntry {
            company: "Calm".to_string(),
            trustpilot_url: "https://ie.trustpilot.com/review/calm.com".to_string(),
            app_store_id: "571800810".to_string(),
            play_store_id: "com.calm.android".to_string(),
        },
        AppEntry {
            company: "Headspace".to_string(),
            trustpilot_url: "https://ie.trustpilot.com/review/headspace.com".to_string(),
            app_store_id: "493145008".to_string(),
            play_store_id: "com.getsomeheadspace.android".to_string(),
        },
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but
    /// can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".reviewlens.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Apply global CLI flags. CLI arguments take precedence over config
    /// file settings; only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Apply scrape-subcommand overrides.
    pub fn merge_scrape(&mut self, args: &ScrapeArgs) {
        if let Some(delay_ms) = args.delay_ms {
            self.scrape.delay_ms = delay_ms;
        }
        if let Some(max_pages) = args.max_pages {
            self.scrape.app_store_max_pages = max_pages;
        }
        if let Some(cap) = args.play_cap {
            self.scrape.play_review_cap = cap;
        }
    }

    /// Apply analyze-subcommand overrides.
    pub fn merge_analyze(&mut self, args: &AnalyzeArgs) {
        if let Some(rule) = args.billing_rule {
            self.classifier.billing_rule = rule.into();
        }
        if let Some(threshold) = args.billing_threshold {
            self.classifier.billing_threshold = threshold;
        }
        if let Some(margin) = args.billing_margin {
            self.classifier.billing_margin = margin;
        }
        if let Some(counting) = args.billing_counting {
            self.classifier.billing_counting = counting.into();
        }
        if let Some(top) = args.top {
            self.report.top_categories = top;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scrape.delay_ms, 1000);
        assert_eq!(config.scrape.app_store_max_pages, 10);
        assert_eq!(config.classifier.billing_threshold, 3);
        assert_eq!(config.apps.len(), 2);
        assert_eq!(config.apps[0].company, "Calm");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_dir = "snapshots"
verbose = true

[scrape]
delay_ms = 250
country = "ie"

[classifier]
billing_rule = "comparative"
billing_margin = 4
billing_counting = "total-occurrences"

[[apps]]
company = "Calm"
trustpilot_url = "https://ie.trustpilot.com/review/calm.com"
app_store_id = "571800810"
play_store_id = "com.calm.android"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_dir, "snapshots");
        assert!(config.general.verbose);
        assert_eq!(config.scrape.delay_ms, 250);
        assert_eq!(config.scrape.country, "ie");
        // Unspecified fields keep their defaults.
        assert_eq!(config.scrape.timeout_seconds, 30);
        assert_eq!(config.classifier.billing_rule, BillingRuleKind::Comparative);
        assert_eq!(config.classifier.billing_margin, 4);
        assert_eq!(config.apps.len(), 1);
    }

    #[test]
    fn test_billing_policy_mapping() {
        let mut classifier = ClassifierConfig::default();
        assert_eq!(classifier.billing().policy, BillingPolicy::TermCountAbove(3));
        assert_eq!(classifier.billing().counting, BillingCounting::DistinctTerms);

        classifier.billing_rule = BillingRuleKind::Comparative;
        classifier.billing_margin = 5;
        assert_eq!(
            classifier.billing().policy,
            BillingPolicy::OutweighsProductBy(5)
        );
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[scrape]"));
        assert!(toml_str.contains("[classifier]"));
        assert!(toml_str.contains("[[apps]]"));
    }
}
