//! Apple App Store connector, via the iTunes customer-reviews RSS feed.
//!
//! The feed serves up to 50 reviews per page for at most 10 pages, newest
//! first. The first entry of a page is often the app's own metadata rather
//! than a review; anything without a rating is skipped.

use super::{
    drain_pages, parse_rfc3339, ConnectorError, PageSource, PageStep, SourceConnector,
};
use crate::config::{AppEntry, ScrapeConfig};
use crate::models::{Review, ScrapeOutcome, Source};
use async_trait::async_trait;
use serde::Deserialize;

pub struct AppStoreConnector {
    client: reqwest::Client,
    delay_ms: u64,
    country: String,
    max_pages: u32,
}

impl AppStoreConnector {
    pub fn new(client: reqwest::Client, cfg: &ScrapeConfig) -> Self {
        Self {
            client,
            delay_ms: cfg.delay_ms,
            country: cfg.country.clone(),
            max_pages: cfg.app_store_max_pages,
        }
    }
}

#[async_trait]
impl SourceConnector for AppStoreConnector {
    fn source(&self) -> Source {
        Source::AppStore
    }

    async fn scrape(&self, app: &AppEntry) -> ScrapeOutcome {
        let mut pager = AppStorePager { conn: self, app };
        drain_pages(&mut pager, Some(self.max_pages), self.delay_ms).await
    }
}

struct AppStorePager<'a> {
    conn: &'a AppStoreConnector,
    app: &'a AppEntry,
}

#[async_trait]
impl PageSource for AppStorePager<'_> {
    async fn page(&mut self, page: u32) -> Result<PageStep, ConnectorError> {
        let url = format!(
            "https://itunes.apple.com/{}/rss/customerreviews/page={}/id={}/sortby=mostrecent/json",
            self.conn.country, page, self.app.app_store_id
        );

        let response = self.conn.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ConnectorError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;

        Ok(PageStep::Records(parse_feed(&body, &self.app.company)?))
    }
}

#[derive(Deserialize)]
struct FeedDocument {
    feed: Feed,
}

#[derive(Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Deserialize)]
struct Entry {
    #[serde(rename = "im:rating")]
    rating: Option<Label>,
    updated: Option<Label>,
    title: Option<Label>,
    content: Option<Label>,
    author: Option<Author>,
    #[serde(rename = "im:version")]
    version: Option<Label>,
}

#[derive(Deserialize)]
struct Author {
    name: Option<Label>,
}

#[derive(Deserialize)]
struct Label {
    label: String,
}

fn non_empty(label: Option<Label>) -> Option<String> {
    label.map(|l| l.label).filter(|s| !s.is_empty())
}

/// Parse one RSS page. Entries without a rating (the app-info entry) are
/// skipped; an absent review body becomes an empty string.
pub(crate) fn parse_feed(body: &str, company: &str) -> Result<Vec<Review>, ConnectorError> {
    let document: FeedDocument = serde_json::from_str(body)
        .map_err(|e| ConnectorError::Malformed(format!("RSS feed JSON: {}", e)))?;

    let reviews = document
        .feed
        .entry
        .into_iter()
        .filter_map(|entry| {
            let rating = entry.rating?;
            let date = entry
                .updated
                .as_ref()
                .and_then(|l| parse_rfc3339(&l.label));
            Some(Review {
                source: Source::AppStore,
                company: company.to_string(),
                rating: rating.label.trim().parse::<u8>().ok(),
                date,
                title: non_empty(entry.title),
                text: entry.content.map(|l| l.label).unwrap_or_default(),
                username: non_empty(entry.author.and_then(|a| a.name)),
                app_version: non_empty(entry.version),
            })
        })
        .collect();

    Ok(reviews)
}
