//! Aggregation and statistics over classified reviews.
//!
//! Everything here is a pure function of its input: group-bys over
//! company/source/category/rating, frequency statistics, and the mined
//! phrase counts. Category rankings are deterministic by construction:
//! counts descend, and ties fall back to rule-table declaration order.

use crate::classifier::{Complaint, PhraseMiner, RuleSet};
use crate::models::{Source, TaggedReview};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

/// One category's frequency within a group of reviews.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
    /// Percentage of the group's reviews carrying this tag.
    pub share: f64,
}

/// An example excerpt retained for a category.
#[derive(Debug, Clone)]
pub struct CategoryExample {
    pub rating: Option<u8>,
    pub source: Source,
    pub text: String,
}

/// Billing-vs-product split of a review group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingSplit {
    pub total: usize,
    pub billing: usize,
    pub product: usize,
}

/// Distinct companies, in first-encountered order.
pub fn companies(rows: &[TaggedReview]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        if seen.insert(row.review.company.clone()) {
            out.push(row.review.company.clone());
        }
    }
    out
}

pub fn by_company<'a>(rows: &'a [TaggedReview], company: &str) -> Vec<&'a TaggedReview> {
    rows.iter().filter(|t| t.review.company == company).collect()
}

pub fn by_source<'a>(rows: &[&'a TaggedReview], source: Source) -> Vec<&'a TaggedReview> {
    rows.iter()
        .copied()
        .filter(|t| t.review.source == source)
        .collect()
}

/// Category frequencies for a group, ordered by count descending. Ties
/// keep rule-table declaration order (the sort is stable and the table is
/// walked in declared order). Categories with zero hits are omitted.
pub fn category_counts(rows: &[&TaggedReview], rules: &RuleSet) -> Vec<CategoryCount> {
    if rows.is_empty() {
        return Vec::new();
    }
    let denom = rows.len() as f64;

    let mut counts: Vec<CategoryCount> = rules
        .categories
        .iter()
        .filter_map(|rule| {
            let count = rows
                .iter()
                .filter(|t| t.tags.iter().any(|tag| tag.category == rule.name))
                .count();
            if count == 0 {
                return None;
            }
            Some(CategoryCount {
                category: rule.name.clone(),
                count,
                share: (count as f64 / denom) * 100.0,
            })
        })
        .collect();

    counts.sort_by_key(|c| Reverse(c.count));
    counts
}

/// The top `n` categories of a group, per [`category_counts`] ordering.
pub fn top_categories(rows: &[&TaggedReview], rules: &RuleSet, n: usize) -> Vec<CategoryCount> {
    let mut counts = category_counts(rows, rules);
    counts.truncate(n);
    counts
}

/// Retain up to `per_category` example excerpts per category, in input
/// order.
pub fn category_examples(
    rows: &[&TaggedReview],
    per_category: usize,
) -> HashMap<String, Vec<CategoryExample>> {
    let mut examples: HashMap<String, Vec<CategoryExample>> = HashMap::new();

    for row in rows {
        for tag in &row.tags {
            let slot = examples.entry(tag.category.clone()).or_default();
            if slot.len() < per_category {
                slot.push(CategoryExample {
                    rating: row.review.rating,
                    source: row.review.source,
                    text: row.review.text.clone(),
                });
            }
        }
    }

    examples
}

/// Star-rating histogram of a group. Unrated reviews are left out.
pub fn rating_distribution(rows: &[&TaggedReview]) -> BTreeMap<u8, usize> {
    let mut dist = BTreeMap::new();
    for row in rows {
        if let Some(rating) = row.review.rating {
            *dist.entry(rating).or_insert(0) += 1;
        }
    }
    dist
}

pub fn average_rating(rows: &[&TaggedReview]) -> Option<f64> {
    let rated: Vec<u8> = rows.iter().filter_map(|t| t.review.rating).collect();
    if rated.is_empty() {
        return None;
    }
    Some(rated.iter().map(|r| *r as f64).sum::<f64>() / rated.len() as f64)
}

pub fn billing_split(rows: &[&TaggedReview]) -> BillingSplit {
    let billing = rows.iter().filter(|t| t.billing_dominant).count();
    BillingSplit {
        total: rows.len(),
        billing,
        product: rows.len() - billing,
    }
}

/// Mined complaint frequencies over the product-focused (non-billing)
/// reviews of a group. Deterministic order: count descending, then
/// complaint kind and detail.
pub fn complaint_frequencies(
    rows: &[&TaggedReview],
    miner: &PhraseMiner,
) -> Vec<(Complaint, usize)> {
    let mut counts: HashMap<Complaint, usize> = HashMap::new();
    for row in rows.iter().filter(|t| !t.billing_dominant) {
        for complaint in miner.complaints(&row.review.text) {
            *counts.entry(complaint).or_insert(0) += 1;
        }
    }

    let mut out: Vec<(Complaint, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Mined feature-request frequencies, deduplicated by normalized prefix
/// so near-identical phrasings collapse to the first (highest-counted)
/// variant.
pub fn feature_request_frequencies(
    rows: &[&TaggedReview],
    miner: &PhraseMiner,
) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows {
        for request in miner.feature_requests(&row.review.text) {
            *counts.entry(request).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut seen_prefixes = HashSet::new();
    ranked
        .into_iter()
        .filter(|(request, _)| {
            let prefix: String = request.chars().take(30).collect::<String>().to_lowercase();
            seen_prefixes.insert(prefix)
        })
        .collect()
}

/// Praised aspects across the 4-5 star reviews of a group: one aspect per
/// review (the first its text matches), aspects below `min_mentions`
/// dropped.
pub fn praised_aspects(
    rows: &[&TaggedReview],
    miner: &PhraseMiner,
    min_mentions: usize,
) -> Vec<(&'static str, usize)> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for row in rows.iter().filter(|t| t.review.rating >= Some(4)) {
        if let Some(aspect) = miner.praised_aspect(&row.review.text) {
            *counts.entry(aspect).or_insert(0) += 1;
        }
    }

    let mut out: Vec<(&'static str, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_mentions)
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    out
}

/// Category frequencies bucketed by star rating.
pub fn counts_by_rating(
    rows: &[&TaggedReview],
    rules: &RuleSet,
) -> BTreeMap<u8, Vec<CategoryCount>> {
    let mut buckets: BTreeMap<u8, Vec<&TaggedReview>> = BTreeMap::new();
    for row in rows.iter().copied() {
        if let Some(rating) = row.review.rating {
            buckets.entry(rating).or_default().push(row);
        }
    }

    buckets
        .into_iter()
        .map(|(rating, group)| (rating, category_counts(&group, rules)))
        .collect()
}
