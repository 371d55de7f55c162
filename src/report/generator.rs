//! Plain-text report generation.
//!
//! Renders the scrape-run summary and the analysis report printed to
//! stdout. The exact formatting is presentation only, not a compatibility
//! contract; the numbers come from [`crate::analysis`].

use crate::analysis::{
    average_rating, billing_split, by_company, by_source, category_examples, companies,
    complaint_frequencies, counts_by_rating, feature_request_frequencies, praised_aspects,
    rating_distribution, top_categories,
};
use crate::classifier::{PhraseMiner, RuleSet};
use crate::config::ReportConfig;
use crate::models::{Review, Source, TaggedReview};

const RULE_WIDTH: usize = 70;

/// Summary printed at the end of a scrape run: per-company and per-source
/// counts, average ratings, and the star histogram.
pub fn scrape_summary(reviews: &[Review]) -> String {
    // The summary reads rating stats straight off the reviews; tags play
    // no part in a scrape run.
    let rows: Vec<TaggedReview> = reviews
        .iter()
        .map(|r| TaggedReview {
            review: r.clone(),
            tags: Vec::new(),
            billing_dominant: false,
        })
        .collect();

    let mut out = String::new();
    push_rule(&mut out, '=');
    out.push_str("SCRAPE SUMMARY\n");
    push_rule(&mut out, '=');

    for company in companies(&rows) {
        let group = by_company(&rows, &company);
        out.push_str(&format!("\n{}:\n", company));
        out.push_str(&format!("  Total reviews: {}\n", group.len()));
        if let Some(avg) = average_rating(&group) {
            out.push_str(&format!("  Average rating: {:.2}\n", avg));
        }

        for source in Source::all() {
            let per_source = by_source(&group, source);
            if per_source.is_empty() {
                continue;
            }
            match average_rating(&per_source) {
                Some(avg) => out.push_str(&format!(
                    "    {}: {} reviews, avg {:.2}\n",
                    source,
                    per_source.len(),
                    avg
                )),
                None => out.push_str(&format!(
                    "    {}: {} reviews\n",
                    source,
                    per_source.len()
                )),
            }
        }

        let dist = rating_distribution(&group);
        if !dist.is_empty() {
            out.push_str("  Rating distribution:\n");
            for (rating, count) in dist.iter().rev() {
                out.push_str(&format!("    {} stars: {}\n", rating, count));
            }
        }
    }

    out
}

/// The full analysis report over classified reviews.
pub fn analysis_report(
    rows: &[TaggedReview],
    rules: &RuleSet,
    miner: &PhraseMiner,
    cfg: &ReportConfig,
) -> String {
    let mut out = String::new();

    push_rule(&mut out, '=');
    out.push_str("REVIEW ANALYSIS: PRODUCT & BILLING COMPLAINTS\n");
    push_rule(&mut out, '=');
    out.push_str(&format!("\nTotal reviews analyzed: {}\n", rows.len()));

    out.push_str(&platform_overview(rows));

    for company in companies(rows) {
        out.push_str(&company_section(rows, &company, rules, miner, cfg));
    }

    out.push_str(&platform_insights(rows, rules));
    out.push_str(&cross_company_section(rows, rules));

    out
}

/// Top product issues per platform, billing-dominant reviews set aside.
fn platform_insights(rows: &[TaggedReview], rules: &RuleSet) -> String {
    let mut out = String::new();
    out.push('\n');
    push_rule(&mut out, '=');
    out.push_str("PLATFORM-SPECIFIC INSIGHTS\n");
    push_rule(&mut out, '=');

    for company in companies(rows) {
        let group = by_company(rows, &company);
        out.push_str(&format!("\n--- {} ---\n", company));

        for source in Source::all() {
            let product_rows: Vec<&TaggedReview> = by_source(&group, source)
                .into_iter()
                .filter(|t| !t.billing_dominant)
                .collect();
            if product_rows.is_empty() {
                continue;
            }
            let top: Vec<String> = top_categories(&product_rows, rules, 3)
                .into_iter()
                .map(|c| display_category(&c.category))
                .collect();
            if top.is_empty() {
                continue;
            }
            out.push_str(&format!("  {}: top issues = {}\n", source, top.join(", ")));
        }
    }

    out
}

/// Per-platform counts and averages.
fn platform_overview(rows: &[TaggedReview]) -> String {
    let mut out = String::new();
    out.push('\n');
    push_rule(&mut out, '=');
    out.push_str("REVIEWS BY PLATFORM\n");
    push_rule(&mut out, '=');

    let all: Vec<&TaggedReview> = rows.iter().collect();
    for source in Source::all() {
        let per_source = by_source(&all, source);
        if per_source.is_empty() {
            continue;
        }
        out.push_str(&format!("\n--- {} ---\n", source));
        for company in companies(rows) {
            let group: Vec<&TaggedReview> = per_source
                .iter()
                .copied()
                .filter(|t| t.review.company == company)
                .collect();
            if group.is_empty() {
                continue;
            }
            match average_rating(&group) {
                Some(avg) => out.push_str(&format!(
                    "  {}: {} reviews, avg {:.2}\n",
                    company,
                    group.len(),
                    avg
                )),
                None => out.push_str(&format!("  {}: {} reviews\n", company, group.len())),
            }
        }
    }

    out
}

fn company_section(
    rows: &[TaggedReview],
    company: &str,
    rules: &RuleSet,
    miner: &PhraseMiner,
    cfg: &ReportConfig,
) -> String {
    let group = by_company(rows, company);
    let split = billing_split(&group);

    let mut out = String::new();
    out.push('\n');
    push_rule(&mut out, '=');
    out.push_str(&format!("ANALYSIS: {}\n", company.to_uppercase()));
    push_rule(&mut out, '=');

    out.push_str(&format!("\nTotal reviews: {}\n", split.total));
    out.push_str(&format!(
        "Billing-dominant reviews (set aside): {}\n",
        split.billing
    ));
    out.push_str(&format!("Product-focused reviews: {}\n", split.product));

    // Issue categories, ranked.
    out.push_str("\n--- ISSUE CATEGORIES (ranked by frequency) ---\n");
    let counts = top_categories(&group, rules, cfg.top_categories);
    let examples = category_examples(&group, cfg.examples_per_category);
    if counts.is_empty() {
        out.push_str("\nNo category triggers matched.\n");
    }
    for entry in &counts {
        out.push_str(&format!(
            "\n{}: {} mentions ({:.1}% of reviews)\n",
            display_category(&entry.category),
            entry.count,
            entry.share
        ));
        out.push_str(&format!("{}\n", "-".repeat(40)));
        if let Some(samples) = examples.get(&entry.category) {
            for example in samples {
                let stars = example
                    .rating
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "?".to_string());
                out.push_str(&format!(
                    "  [{}, {}*] \"{}\"\n",
                    example.source,
                    stars,
                    clean_excerpt(&example.text, 200)
                ));
            }
        }
    }

    // Heuristic extractions. Illustrative only, and labeled as such.
    out.push_str("\n--- SPECIFIC COMPLAINTS EXTRACTED (heuristic) ---\n\n");
    let complaints = complaint_frequencies(&group, miner);
    let mut shown = 0;
    for (complaint, count) in &complaints {
        if *count < 2 || shown >= cfg.top_complaints {
            continue;
        }
        out.push_str(&format!(
            "  - {}: '{}' ({}x)\n",
            complaint.kind, complaint.detail, count
        ));
        shown += 1;
    }
    if shown == 0 {
        out.push_str("  (no recurring complaint phrases)\n");
    }

    out.push_str("\n--- FEATURE REQUESTS (heuristic) ---\n\n");
    let requests = feature_request_frequencies(&group, miner);
    if requests.is_empty() {
        out.push_str("  (none extracted)\n");
    }
    for (request, count) in requests.iter().take(cfg.top_requests) {
        if *count > 1 {
            out.push_str(&format!("  - \"{}\" ({}x)\n", clean_excerpt(request, 80), count));
        } else {
            out.push_str(&format!("  - \"{}\"\n", clean_excerpt(request, 80)));
        }
    }

    out.push_str("\n--- PRAISED FEATURES (4-5 star reviews) ---\n\n");
    let praised = praised_aspects(&group, miner, cfg.min_praise_mentions);
    if praised.is_empty() {
        out.push_str("  (nothing above the mention threshold)\n");
    }
    for (aspect, count) in praised {
        out.push_str(&format!("  {}: {} mentions\n", display_category(aspect), count));
    }

    // Issues by star rating.
    let by_rating = counts_by_rating(&group, rules);
    if !by_rating.is_empty() {
        out.push_str("\n--- TOP ISSUES BY STAR RATING ---\n\n");
        for (rating, counts) in &by_rating {
            let top: Vec<String> = counts
                .iter()
                .take(3)
                .map(|c| format!("{} ({})", display_category(&c.category), c.count))
                .collect();
            if !top.is_empty() {
                out.push_str(&format!("  {} stars: {}\n", rating, top.join(", ")));
            }
        }
    }

    out
}

/// Top issues per company, side by side.
fn cross_company_section(rows: &[TaggedReview], rules: &RuleSet) -> String {
    let mut out = String::new();
    out.push('\n');
    push_rule(&mut out, '=');
    out.push_str("CROSS-COMPANY COMPARISON\n");
    push_rule(&mut out, '=');

    for company in companies(rows) {
        let group = by_company(rows, &company);
        out.push_str(&format!("\n{} top issues:\n", company));
        for entry in top_categories(&group, rules, 5) {
            out.push_str(&format!(
                "  {:3} ({:4.1}%) - {}\n",
                entry.count,
                entry.share,
                display_category(&entry.category)
            ));
        }
    }

    out
}

fn push_rule(out: &mut String, ch: char) {
    for _ in 0..RULE_WIDTH {
        out.push(ch);
    }
    out.push('\n');
}

/// "app_crashes_bugs" -> "App Crashes Bugs".
fn display_category(slug: &str) -> String {
    slug.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Excerpt text for display: ASCII only, newlines collapsed, truncated.
fn clean_excerpt(text: &str, max_len: usize) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii() && *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.len() > max_len {
        format!("{}...", &cleaned[..max_len])
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{BillingConfig, Classifier};
    use crate::models::Source;

    fn make_review(company: &str, source: Source, rating: u8, text: &str) -> Review {
        Review {
            source,
            company: company.to_string(),
            rating: Some(rating),
            date: None,
            title: None,
            text: text.to_string(),
            username: None,
            app_version: None,
        }
    }

    fn classify_all(reviews: Vec<Review>) -> Vec<TaggedReview> {
        let classifier = Classifier::new(RuleSet::builtin(), BillingConfig::default());
        reviews
            .into_iter()
            .map(|r| {
                let c = classifier.classify(&r.text);
                TaggedReview {
                    review: r,
                    tags: c.tags,
                    billing_dominant: c.billing_dominant,
                }
            })
            .collect()
    }

    #[test]
    fn test_scrape_summary_contents() {
        let reviews = vec![
            make_review("Calm", Source::AppStore, 5, "lovely"),
            make_review("Calm", Source::Trustpilot, 1, "awful"),
            make_review("Headspace", Source::GooglePlay, 3, "fine"),
        ];

        let summary = scrape_summary(&reviews);
        assert!(summary.contains("Calm:"));
        assert!(summary.contains("Headspace:"));
        assert!(summary.contains("Total reviews: 2"));
        assert!(summary.contains("Average rating: 3.00"));
        assert!(summary.contains("5 stars: 1"));
    }

    #[test]
    fn test_analysis_report_sections() {
        let rows = classify_all(vec![
            make_review("Calm", Source::AppStore, 1, "App keeps crashing since the update"),
            make_review("Calm", Source::Trustpilot, 1, "crash crash and more crashes"),
            make_review("Calm", Source::AppStore, 5, "The sleep stories are wonderful"),
            make_review(
                "Headspace",
                Source::GooglePlay,
                2,
                "Charged me twice, refund denied, cancel subscription scam",
            ),
        ]);

        let cfg = ReportConfig::default();
        let report = analysis_report(&rows, &RuleSet::builtin(), &PhraseMiner::builtin(), &cfg);

        assert!(report.contains("Total reviews analyzed: 4"));
        assert!(report.contains("ANALYSIS: CALM"));
        assert!(report.contains("ANALYSIS: HEADSPACE"));
        assert!(report.contains("App Crashes Bugs"));
        assert!(report.contains("Billing-dominant reviews (set aside): 1"));
        assert!(report.contains("CROSS-COMPANY COMPARISON"));
        assert!(report.contains("PLATFORM-SPECIFIC INSIGHTS"));
        assert!(report.contains("REVIEWS BY PLATFORM"));
    }

    #[test]
    fn test_display_category() {
        assert_eq!(display_category("app_crashes_bugs"), "App Crashes Bugs");
        assert_eq!(display_category("ui_ux_design"), "Ui Ux Design");
    }

    #[test]
    fn test_clean_excerpt() {
        assert_eq!(clean_excerpt("ok\nfine\u{1F600} then", 80), "ok fine then");
        let long = "x".repeat(300);
        let excerpt = clean_excerpt(&long, 200);
        assert_eq!(excerpt.len(), 203);
        assert!(excerpt.ends_with("..."));
    }
}
