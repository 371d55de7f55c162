//! Source connectors: one paginated fetch per review platform.
//!
//! Every connector walks pages strictly in order through the shared
//! [`drain_pages`] loop: one request per page, a polite delay between
//! pages, and a terminal reason code when the stream ends. A failure on
//! one page ends that source's stream but keeps everything collected so
//! far; nothing is retried and nothing propagates past the connector
//! boundary.

pub mod appstore;
pub mod googleplay;
pub mod trustpilot;

pub use appstore::AppStoreConnector;
pub use googleplay::GooglePlayConnector;
pub use trustpilot::TrustpilotConnector;

use crate::config::{AppEntry, ScrapeConfig};
use crate::models::{Review, ScrapeOutcome, Source, StopReason};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a single page fetch. Terminal for the connector run.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ConnectorError {
    pub fn stop_reason(&self) -> StopReason {
        match self {
            ConnectorError::Transport(_) | ConnectorError::Status(_) => {
                StopReason::TransportError
            }
            ConnectorError::Malformed(_) => StopReason::MalformedResponse,
        }
    }
}

/// A review-source connector. `scrape` never fails outright: errors are
/// folded into the outcome's stop reason alongside the partial results.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    fn source(&self) -> Source;
    async fn scrape(&self, app: &AppEntry) -> ScrapeOutcome;
}

/// What one page fetch produced.
#[derive(Debug)]
pub(crate) enum PageStep {
    /// Parsed records for this page; an empty batch ends the stream.
    Records(Vec<Review>),
    /// A recognized stop condition (auth wall, last page reached).
    End(StopReason),
}

/// Per-source pagination state. Implementations own whatever bookkeeping
/// their platform needs (total page count, continuation tokens).
#[async_trait]
pub(crate) trait PageSource {
    async fn page(&mut self, page: u32) -> Result<PageStep, ConnectorError>;
}

/// The shared page loop: fetch pages 1, 2, ... until a stop condition,
/// an optional page cap, or a failure. Strictly sequential; no retries.
pub(crate) async fn drain_pages<P>(
    pager: &mut P,
    max_pages: Option<u32>,
    delay_ms: u64,
) -> ScrapeOutcome
where
    P: PageSource + Send + ?Sized,
{
    let mut reviews = Vec::new();
    let mut pages_fetched = 0u32;
    let mut page = 1u32;

    let stop = loop {
        match pager.page(page).await {
            Err(err) => {
                warn!("Page {} failed: {}", page, err);
                break err.stop_reason();
            }
            Ok(PageStep::End(reason)) => break reason,
            Ok(PageStep::Records(batch)) => {
                pages_fetched += 1;
                if batch.is_empty() {
                    debug!("Page {} yielded no reviews, stopping", page);
                    break StopReason::Exhausted;
                }
                debug!("Page {}: {} reviews", page, batch.len());
                reviews.extend(batch);
                if max_pages.map_or(false, |max| page >= max) {
                    break StopReason::Exhausted;
                }
                page += 1;
                polite_delay(delay_ms).await;
            }
        }
    };

    ScrapeOutcome {
        reviews,
        stop,
        pages_fetched,
    }
}

/// Fixed delay between page requests. Politeness, not correctness.
pub(crate) async fn polite_delay(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

/// Build the HTTP client all connectors share: browser-like headers and a
/// single per-request timeout. A timeout is a terminal transport error for
/// the connector run that hits it.
pub fn build_http_client(cfg: &ScrapeConfig) -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    reqwest::Client::builder()
        .user_agent(cfg.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(cfg.timeout_seconds))
        .build()
        .expect("Failed to create HTTP client")
}

/// Instantiate connectors for the enabled sources, in scrape order.
pub fn build_connectors(
    client: &reqwest::Client,
    cfg: &ScrapeConfig,
    enabled: &[Source],
) -> Vec<Box<dyn SourceConnector>> {
    Source::all()
        .into_iter()
        .filter(|s| enabled.contains(s))
        .map(|source| -> Box<dyn SourceConnector> {
            match source {
                Source::AppStore => Box::new(AppStoreConnector::new(client.clone(), cfg)),
                Source::GooglePlay => Box::new(GooglePlayConnector::new(client.clone(), cfg)),
                Source::Trustpilot => Box::new(TrustpilotConnector::new(client.clone(), cfg)),
            }
        })
        .collect()
}

pub(crate) fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPager {
        steps: Vec<Result<PageStep, ConnectorError>>,
    }

    impl ScriptedPager {
        fn new(steps: Vec<Result<PageStep, ConnectorError>>) -> Self {
            Self { steps }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedPager {
        async fn page(&mut self, _page: u32) -> Result<PageStep, ConnectorError> {
            self.steps.remove(0)
        }
    }

    fn batch(n: usize) -> PageStep {
        let reviews = (0..n)
            .map(|i| Review {
                source: Source::AppStore,
                company: "Calm".to_string(),
                rating: Some(3),
                date: None,
                title: None,
                text: format!("review {}", i),
                username: None,
                app_version: None,
            })
            .collect();
        PageStep::Records(reviews)
    }

    #[tokio::test]
    async fn test_empty_page_stops_with_exhausted() {
        // Page 3 of a nominal 5 comes back empty: the stream stops there,
        // keeping everything from pages 1-2.
        let mut pager = ScriptedPager::new(vec![
            Ok(batch(2)),
            Ok(batch(3)),
            Ok(batch(0)),
            Ok(batch(4)),
            Ok(batch(4)),
        ]);

        let outcome = drain_pages(&mut pager, None, 0).await;
        assert_eq!(outcome.reviews.len(), 5);
        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert_eq!(outcome.pages_fetched, 3);
    }

    #[tokio::test]
    async fn test_transport_error_preserves_partial_results() {
        let mut pager = ScriptedPager::new(vec![
            Ok(batch(2)),
            Err(ConnectorError::Status(503)),
        ]);

        let outcome = drain_pages(&mut pager, None, 0).await;
        assert_eq!(outcome.reviews.len(), 2);
        assert_eq!(outcome.stop, StopReason::TransportError);
    }

    #[tokio::test]
    async fn test_malformed_payload_reason() {
        let mut pager = ScriptedPager::new(vec![Err(ConnectorError::Malformed(
            "missing feed".to_string(),
        ))]);

        let outcome = drain_pages(&mut pager, None, 0).await;
        assert!(outcome.reviews.is_empty());
        assert_eq!(outcome.stop, StopReason::MalformedResponse);
    }

    #[tokio::test]
    async fn test_auth_wall_is_a_stop_not_an_error() {
        let mut pager = ScriptedPager::new(vec![
            Ok(batch(1)),
            Ok(PageStep::End(StopReason::AuthWall)),
        ]);

        let outcome = drain_pages(&mut pager, None, 0).await;
        assert_eq!(outcome.reviews.len(), 1);
        assert_eq!(outcome.stop, StopReason::AuthWall);
        assert!(!outcome.stop.is_error());
    }

    #[tokio::test]
    async fn test_page_cap_enforced() {
        let mut pager = ScriptedPager::new(vec![Ok(batch(2)), Ok(batch(2)), Ok(batch(2))]);

        let outcome = drain_pages(&mut pager, Some(2), 0).await;
        assert_eq!(outcome.reviews.len(), 4);
        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert_eq!(outcome.pages_fetched, 2);
    }

    #[test]
    fn test_error_stop_reasons() {
        assert_eq!(
            ConnectorError::Status(404).stop_reason(),
            StopReason::TransportError
        );
        assert_eq!(
            ConnectorError::Malformed("x".to_string()).stop_reason(),
            StopReason::MalformedResponse
        );
    }

    #[test]
    fn test_parse_rfc3339_formats() {
        assert!(parse_rfc3339("2026-05-01T12:34:56.000Z").is_some());
        assert!(parse_rfc3339("2026-10-01T07:00:00-07:00").is_some());
        assert!(parse_rfc3339("last tuesday").is_none());
    }
}
