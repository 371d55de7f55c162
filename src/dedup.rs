//! Review deduplication.
//!
//! A stable filter that keeps the first occurrence per identity key
//! `(company, text)`. The key deliberately ignores source and rating, so
//! identical text collected from two platforms collapses to one record.

use crate::models::Review;
use std::collections::HashSet;
use tracing::debug;

/// Remove duplicate reviews, keeping the first occurrence of each identity
/// key and preserving the order of kept records. Returns the deduplicated
/// set and the number of records removed.
pub fn dedup_reviews(reviews: Vec<Review>) -> (Vec<Review>, usize) {
    let before = reviews.len();
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(before);
    let mut kept = Vec::with_capacity(before);

    for review in reviews {
        let (company, text) = review.identity_key();
        let key = (company.to_string(), text.to_string());
        if seen.insert(key) {
            kept.push(review);
        }
    }

    let removed = before - kept.len();
    if removed > 0 {
        debug!("Deduplication removed {} of {} reviews", removed, before);
    }
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn make_review(source: Source, company: &str, text: &str, rating: u8) -> Review {
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

    #[test]
    fn test_cross_source_duplicates_collapse_to_first() {
        let reviews = vec![
            make_review(Source::Trustpilot, "Calm", "Love it", 5),
            make_review(Source::AppStore, "Calm", "Love it", 1),
        ];

        let (kept, removed) = dedup_reviews(reviews);
        assert_eq!(kept.len(), 1);
        assert_eq!(removed, 1);
        // First encountered wins, other fields and all.
        assert_eq!(kept[0].source, Source::Trustpilot);
        assert_eq!(kept[0].rating, Some(5));
    }

    #[test]
    fn test_different_company_same_text_kept() {
        let reviews = vec![
            make_review(Source::Trustpilot, "Calm", "Love it", 5),
            make_review(Source::Trustpilot, "Headspace", "Love it", 5),
        ];

        let (kept, removed) = dedup_reviews(reviews);
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_order_preserved() {
        let reviews = vec![
            make_review(Source::Trustpilot, "Calm", "first", 1),
            make_review(Source::Trustpilot, "Calm", "second", 2),
            make_review(Source::Trustpilot, "Calm", "first", 3),
            make_review(Source::Trustpilot, "Calm", "third", 3),
        ];

        let (kept, _) = dedup_reviews(reviews);
        let texts: Vec<&str> = kept.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_idempotent() {
        let reviews = vec![
            make_review(Source::Trustpilot, "Calm", "a", 1),
            make_review(Source::AppStore, "Calm", "a", 2),
            make_review(Source::GooglePlay, "Headspace", "b", 3),
        ];

        let (once, _) = dedup_reviews(reviews);
        let texts_once: Vec<String> = once.iter().map(|r| r.text.clone()).collect();
        let (twice, removed) = dedup_reviews(once);
        let texts_twice: Vec<String> = twice.iter().map(|r| r.text.clone()).collect();

        assert_eq!(removed, 0);
        assert_eq!(texts_once, texts_twice);
    }

    #[test]
    fn test_no_two_outputs_share_identity_key() {
        let reviews = vec![
            make_review(Source::Trustpilot, "Calm", "x", 1),
            make_review(Source::AppStore, "Calm", "x", 1),
            make_review(Source::AppStore, "Calm", "y", 1),
            make_review(Source::GooglePlay, "Calm", "y", 1),
            make_review(Source::GooglePlay, "Headspace", "x", 1),
        ];

        let (kept, _) = dedup_reviews(reviews);
        let mut keys: Vec<(String, String)> = kept
            .iter()
            .map(|r| (r.company.clone(), r.text.clone()))
            .collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }
}
