//! Data models for the review pipeline.
//!
//! This module contains the core data structures used throughout
//! the application for representing reviews, tags, and scrape outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The platform a review originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Apple App Store (iTunes RSS feed)
    AppStore,
    /// Google Play Store
    GooglePlay,
    /// Trustpilot business page
    Trustpilot,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Source {
    /// The label used in persisted snapshots. Part of the snapshot
    /// column/value contract, do not change casually.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::AppStore => "App Store",
            Source::GooglePlay => "Google Play",
            Source::Trustpilot => "Trustpilot",
        }
    }

    /// Parse a snapshot label back into a source. Case-insensitive.
    pub fn parse(s: &str) -> Option<Source> {
        match s.trim().to_lowercase().as_str() {
            "app store" | "appstore" => Some(Source::AppStore),
            "google play" | "googleplay" | "play store" => Some(Source::GooglePlay),
            "trustpilot" => Some(Source::Trustpilot),
            _ => None,
        }
    }

    /// All sources, in the order they are scraped and reported.
    pub fn all() -> [Source; 3] {
        [Source::AppStore, Source::GooglePlay, Source::Trustpilot]
    }
}

/// A single user review, as collected by a source connector.
///
/// Reviews are immutable once created; a re-scrape produces a new set that
/// is deduplicated before being written as a fresh snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Platform the review was collected from.
    pub source: Source,
    /// Company/app the review is about (e.g. "Calm").
    pub company: String,
    /// Star rating 1-5, when the source provided one.
    pub rating: Option<u8>,
    /// Publication timestamp, when parseable. Source formats differ.
    pub date: Option<DateTime<Utc>>,
    /// Review title. Trustpilot and Google Play reviews have none.
    pub title: Option<String>,
    /// Review body. Never null: absent text is normalized to an empty
    /// string and yields zero category tags.
    pub text: String,
    /// Reviewer display name, when available.
    pub username: Option<String>,
    /// App version the review was written against, when available.
    pub app_version: Option<String>,
}

impl Review {
    /// The identity key used for deduplication.
    ///
    /// Two reviews with the same company and text body are the same review
    /// regardless of source or rating.
    pub fn identity_key(&self) -> (&str, &str) {
        (&self.company, &self.text)
    }
}

/// A category label attached to a review by the classifier.
///
/// Derived, never stored: tags are a pure function of review text and the
/// rule table in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTag {
    /// Category slug from the rule table (e.g. "ui_ux_design").
    pub category: String,
    /// The keyword or pattern that triggered the tag, for traceability.
    pub matched: String,
}

/// A review together with its derived classification.
#[derive(Debug, Clone)]
pub struct TaggedReview {
    pub review: Review,
    pub tags: Vec<CategoryTag>,
    /// True when the review is judged to be primarily about
    /// subscription/billing rather than the product.
    pub billing_dominant: bool,
}

/// Why a paginated scrape stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// All pages consumed, or a page yielded zero records.
    Exhausted,
    /// The source answered with a sign-in/redirect wall. A recognized
    /// terminal condition, not an error.
    AuthWall,
    /// Network/HTTP failure on one page.
    TransportError,
    /// Response payload was missing the expected structure.
    MalformedResponse,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Exhausted => "exhausted",
            StopReason::AuthWall => "auth_wall",
            StopReason::TransportError => "transport_error",
            StopReason::MalformedResponse => "malformed_response",
        }
    }

    /// Whether the stream ended on a failure rather than a normal stop.
    pub fn is_error(&self) -> bool {
        matches!(self, StopReason::TransportError | StopReason::MalformedResponse)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one connector run: whatever was collected before the stream
/// ended, plus why it ended. A transport failure mid-stream still yields
/// the records gathered from earlier pages.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub reviews: Vec<Review>,
    pub stop: StopReason,
    /// Pages that returned a parseable (possibly empty) batch.
    pub pages_fetched: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_review(company: &str, text: &str) -> Review {
        Review {
            source: Source::Trustpilot,
            company: company.to_string(),
            rating: Some(3),
            date: None,
            title: None,
            text: text.to_string(),
            username: None,
            app_version: None,
        }
    }

    #[test]
    fn test_source_labels_round_trip() {
        for source in Source::all() {
            assert_eq!(Source::parse(source.as_str()), Some(source));
        }
        assert_eq!(Source::parse("google play"), Some(Source::GooglePlay));
        assert_eq!(Source::parse("unknown platform"), None);
    }

    #[test]
    fn test_identity_key_ignores_source_and_rating() {
        let a = make_review("Calm", "Love it");
        let mut b = make_review("Calm", "Love it");
        b.source = Source::AppStore;
        b.rating = Some(1);
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_stop_reason_codes() {
        assert_eq!(StopReason::Exhausted.as_str(), "exhausted");
        assert_eq!(StopReason::AuthWall.as_str(), "auth_wall");
        assert!(!StopReason::AuthWall.is_error());
        assert!(StopReason::TransportError.is_error());
        assert!(StopReason::MalformedResponse.is_error());
    }
}
