//! Rule-based review classification.
//!
//! The classifier assigns category tags from an ordered rule table and
//! computes the billing-dominance signal. It holds no mutable state: given
//! identical text and an identical rule set, output is identical.

pub mod extract;
pub mod rules;

pub use extract::{Complaint, ComplaintKind, PhraseMiner};
pub use rules::{CategoryRule, RuleSet, Trigger};

use crate::models::CategoryTag;
use serde::{Deserialize, Serialize};

/// How billing/product term hits are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BillingCounting {
    /// Count each term at most once, however often it occurs.
    DistinctTerms,
    /// Count every occurrence of every term.
    TotalOccurrences,
}

/// Which billing-dominance rule is in effect.
///
/// The two variants come from the source data itself, which disagrees on
/// the exact rule; neither is "the fix" for the other. The default is
/// [`BillingPolicy::TermCountAbove`] with threshold 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingPolicy {
    /// Billing-dominant when the billing-term score is strictly greater
    /// than the threshold.
    TermCountAbove(usize),
    /// Billing-dominant when the billing-term score exceeds the
    /// product-term score by more than the margin.
    OutweighsProductBy(usize),
}

/// Billing-signal configuration: counting rule plus policy, both explicit.
#[derive(Debug, Clone, Copy)]
pub struct BillingConfig {
    pub counting: BillingCounting,
    pub policy: BillingPolicy,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            counting: BillingCounting::DistinctTerms,
            policy: BillingPolicy::TermCountAbove(3),
        }
    }
}

/// The derived classification of one review text.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub tags: Vec<CategoryTag>,
    pub billing_dominant: bool,
}

/// Tags review text against an immutable rule set.
pub struct Classifier {
    rules: RuleSet,
    billing: BillingConfig,
}

impl Classifier {
    pub fn new(rules: RuleSet, billing: BillingConfig) -> Self {
        Self { rules, billing }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify one review text. Empty or whitespace-only text yields no
    /// tags and a false billing signal.
    pub fn classify(&self, text: &str) -> Classification {
        if text.trim().is_empty() {
            return Classification::default();
        }
        Classification {
            tags: self.categorize(text),
            billing_dominant: self.is_billing_dominant(text),
        }
    }

    /// Assign category tags. Each category's trigger list is scanned in
    /// order and stops at its first hit; categories are evaluated
    /// independently, so a review may carry many tags.
    pub fn categorize(&self, text: &str) -> Vec<CategoryTag> {
        let lowered = text.to_lowercase();
        let mut tags = Vec::new();

        for rule in &self.rules.categories {
            if let Some(trigger) = rule.triggers.iter().find(|t| t.matches(&lowered)) {
                tags.push(CategoryTag {
                    category: rule.name.clone(),
                    matched: trigger.source().to_string(),
                });
            }
        }

        tags
    }

    /// Whether the review is primarily a subscription/billing complaint.
    pub fn is_billing_dominant(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        let billing = self.term_score(&self.rules.billing_terms, &lowered);

        match self.billing.policy {
            BillingPolicy::TermCountAbove(threshold) => billing > threshold,
            BillingPolicy::OutweighsProductBy(margin) => {
                let product = self.term_score(&self.rules.product_terms, &lowered);
                billing > product + margin
            }
        }
    }

    fn term_score(&self, terms: &[String], lowered: &str) -> usize {
        match self.billing.counting {
            BillingCounting::DistinctTerms => terms
                .iter()
                .filter(|t| lowered.contains(t.as_str()))
                .count(),
            BillingCounting::TotalOccurrences => terms
                .iter()
                .map(|t| lowered.matches(t.as_str()).count())
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_classifier() -> Classifier {
        Classifier::new(RuleSet::builtin(), BillingConfig::default())
    }

    fn tag_names(tags: &[CategoryTag]) -> Vec<&str> {
        tags.iter().map(|t| t.category.as_str()).collect()
    }

    #[test]
    fn test_sleep_stories_scenario() {
        let classifier = default_classifier();
        let result = classifier
            .classify("Great app but I can't find the sleep stories, very confusing menu");

        let names = tag_names(&result.tags);
        assert!(names.contains(&"ui_ux_design"));
        assert!(names.contains(&"content_quality"));
        assert!(!result.billing_dominant);
    }

    #[test]
    fn test_billing_dominant_scenario() {
        let classifier = default_classifier();
        let result = classifier.classify("Charged me twice, refund denied, cancel subscription scam");
        // charge/charged, refund, cancel, subscription, scam: well past the
        // default threshold of 3 distinct terms.
        assert!(result.billing_dominant);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let classifier = default_classifier();
        let result = classifier.classify("   ");
        assert!(result.tags.is_empty());
        assert!(!result.billing_dominant);
    }

    #[test]
    fn test_deterministic() {
        let classifier = default_classifier();
        let text = "App keeps crashing and support ignored my email";
        let first = classifier.classify(text);
        let second = classifier.classify(text);
        assert_eq!(first.tags, second.tags);
        assert_eq!(first.billing_dominant, second.billing_dominant);
    }

    #[test]
    fn test_tags_record_matched_trigger() {
        let classifier = default_classifier();
        let tags = classifier.categorize("it keeps crashing");
        let crash_tag = tags
            .iter()
            .find(|t| t.category == "app_crashes_bugs")
            .expect("crash tag");
        assert_eq!(crash_tag.matched, "crash");
    }

    #[test]
    fn test_case_insensitive_matching() {
        let classifier = default_classifier();
        let tags = classifier.categorize("CRASHES CONSTANTLY");
        assert!(tag_names(&tags).contains(&"app_crashes_bugs"));
    }

    #[test]
    fn test_billing_monotonic_under_occurrence_counting() {
        let classifier = Classifier::new(
            RuleSet::builtin(),
            BillingConfig {
                counting: BillingCounting::TotalOccurrences,
                policy: BillingPolicy::TermCountAbove(3),
            },
        );

        let mut text = String::from("refund refund refund refund");
        assert!(classifier.is_billing_dominant(&text));

        // Appending more billing terms never withdraws the signal.
        for _ in 0..5 {
            text.push_str(" refund");
            assert!(classifier.is_billing_dominant(&text));
        }
    }

    #[test]
    fn test_distinct_counting_ignores_repeats() {
        let classifier = default_classifier();
        // One distinct billing term, repeated: distinct count is 1, not 5.
        assert!(!classifier.is_billing_dominant("refund refund refund refund refund"));
    }

    #[test]
    fn test_comparative_policy() {
        let classifier = Classifier::new(
            RuleSet::builtin(),
            BillingConfig {
                counting: BillingCounting::DistinctTerms,
                policy: BillingPolicy::OutweighsProductBy(2),
            },
        );

        // Billing terms: cancel, refund, scam, payment, pay (5); product
        // terms: app (1). 5 > 1 + 2 holds.
        assert!(classifier
            .is_billing_dominant("cancel and refund this scam payment, the app is fine"));

        // Balanced text: billing refund/payment/pay/scam (4), product
        // app/content (2); 4 > 2 + 2 fails.
        assert!(!classifier
            .is_billing_dominant("refund the payment scam but the app content is good"));
    }
}
