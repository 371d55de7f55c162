//! Google Play connector.
//!
//! Play has no public review feed; listings come from the store UI's
//! internal `batchexecute` endpoint. Each request returns up to 150 of the
//! most recent reviews plus a continuation token; the connector follows
//! tokens until the configured cap or the end of the stream. The response
//! rides the usual anti-JSON guard prefix and double-encoded payload.

use super::{drain_pages, ConnectorError, PageSource, PageStep, SourceConnector};
use crate::config::{AppEntry, ScrapeConfig};
use crate::models::{Review, ScrapeOutcome, Source, StopReason};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

/// Reviews per batchexecute request.
const PAGE_SIZE: usize = 150;
/// Sort selector for "newest first".
const SORT_NEWEST: u8 = 2;
const RPC_ID: &str = "UsvDTd";

pub struct GooglePlayConnector {
    client: reqwest::Client,
    delay_ms: u64,
    country: String,
    language: String,
    review_cap: usize,
}

impl GooglePlayConnector {
    pub fn new(client: reqwest::Client, cfg: &ScrapeConfig) -> Self {
        Self {
            client,
            delay_ms: cfg.delay_ms,
            country: cfg.country.clone(),
            language: cfg.language.clone(),
            review_cap: cfg.play_review_cap,
        }
    }
}

#[async_trait]
impl SourceConnector for GooglePlayConnector {
    fn source(&self) -> Source {
        Source::GooglePlay
    }

    async fn scrape(&self, app: &AppEntry) -> ScrapeOutcome {
        let mut pager = PlayPager {
            conn: self,
            app,
            token: None,
            fetched: 0,
            done: false,
        };
        drain_pages(&mut pager, None, self.delay_ms).await
    }
}

struct PlayPager<'a> {
    conn: &'a GooglePlayConnector,
    app: &'a AppEntry,
    token: Option<String>,
    fetched: usize,
    done: bool,
}

#[async_trait]
impl PageSource for PlayPager<'_> {
    async fn page(&mut self, _page: u32) -> Result<PageStep, ConnectorError> {
        if self.done {
            return Ok(PageStep::End(StopReason::Exhausted));
        }
        let remaining = self.conn.review_cap.saturating_sub(self.fetched);
        if remaining == 0 {
            return Ok(PageStep::End(StopReason::Exhausted));
        }

        let url = format!(
            "https://play.google.com/_/PlayStoreUi/data/batchexecute?rpcids={}&hl={}&gl={}",
            RPC_ID, self.conn.language, self.conn.country
        );
        let envelope = request_envelope(
            &self.app.play_store_id,
            remaining.min(PAGE_SIZE),
            self.token.as_deref(),
        );

        let response = self
            .conn
            .client
            .post(&url)
            .form(&[("f.req", envelope)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ConnectorError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;

        let page = parse_batch(&body, &self.app.company)?;
        self.fetched += page.reviews.len();
        self.token = page.next_token;
        if self.token.is_none() {
            self.done = true;
        }

        Ok(PageStep::Records(page.reviews))
    }
}

/// One parsed batchexecute response.
#[derive(Debug)]
pub(crate) struct PlayPage {
    pub reviews: Vec<Review>,
    pub next_token: Option<String>,
}

/// Build the `f.req` envelope for one review-listing request. The inner
/// request is itself JSON-encoded into a string, as the endpoint expects.
pub(crate) fn request_envelope(app_id: &str, count: usize, token: Option<&str>) -> String {
    let paging = match token {
        Some(t) => json!([count, Value::Null, t]),
        None => json!([count]),
    };
    let request = json!([Value::Null, Value::Null, [SORT_NEWEST, 2, paging], [app_id, 7]]);
    json!([[[RPC_ID, request.to_string(), Value::Null, "generic"]]]).to_string()
}

/// Parse a batchexecute response body into reviews plus the continuation
/// token (carried at position `[1][1]` of the double-encoded payload).
pub(crate) fn parse_batch(body: &str, company: &str) -> Result<PlayPage, ConnectorError> {
    // Responses open with the `)]}'` guard line before the JSON body.
    let start = body
        .find('[')
        .ok_or_else(|| ConnectorError::Malformed("empty batch response".to_string()))?;
    let outer: Value = serde_json::from_str(&body[start..])
        .map_err(|e| ConnectorError::Malformed(format!("batch envelope: {}", e)))?;

    let payload = match outer.get(0).and_then(|envelope| envelope.get(2)) {
        Some(Value::String(payload)) => payload,
        // A null payload means the app has no (more) reviews.
        _ => {
            return Ok(PlayPage {
                reviews: Vec::new(),
                next_token: None,
            })
        }
    };

    let inner: Value = serde_json::from_str(payload)
        .map_err(|e| ConnectorError::Malformed(format!("batch payload: {}", e)))?;

    let reviews = inner
        .get(0)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(|item| parse_item(item, company)).collect())
        .unwrap_or_default();

    let next_token = inner
        .get(1)
        .and_then(|trailer| trailer.get(1))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(PlayPage {
        reviews,
        next_token,
    })
}

fn parse_item(item: &Value, company: &str) -> Review {
    let text_field = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Review {
        source: Source::GooglePlay,
        company: company.to_string(),
        rating: item
            .get(2)
            .and_then(Value::as_u64)
            .and_then(|r| u8::try_from(r).ok()),
        date: item
            .get(5)
            .and_then(|at| at.get(0))
            .and_then(Value::as_i64)
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        title: None,
        text: item
            .get(4)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        username: text_field(item.get(1).and_then(|author| author.get(0))),
        app_version: text_field(item.get(10)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_item(name: &str, score: u8, text: &str, version: Option<&str>) -> Value {
        json!([
            "gp:review-id",
            [name, []],
            score,
            Value::Null,
            text,
            [1767225600, 0],
            12,
            Value::Null,
            Value::Null,
            Value::Null,
            version
        ])
    }

    fn batch_body(items: Value, token: Option<&str>) -> String {
        let trailer = match token {
            Some(t) => json!([Value::Null, t]),
            None => Value::Null,
        };
        let payload = json!([items, trailer]).to_string();
        let outer = json!([["wrb.fr", RPC_ID, payload, Value::Null, "generic"]]).to_string();
        format!(")]}}'\n\n{}", outer)
    }

    #[test]
    fn test_parse_batch_fields() {
        let body = batch_body(
            json!([review_item("Maya", 4, "Good app but laggy on my tablet", Some("6.2.1"))]),
            Some("token-abc"),
        );

        let page = parse_batch(&body, "Headspace").unwrap();
        assert_eq!(page.reviews.len(), 1);
        assert_eq!(page.next_token.as_deref(), Some("token-abc"));

        let review = &page.reviews[0];
        assert_eq!(review.source, Source::GooglePlay);
        assert_eq!(review.company, "Headspace");
        assert_eq!(review.rating, Some(4));
        assert_eq!(review.text, "Good app but laggy on my tablet");
        assert_eq!(review.username.as_deref(), Some("Maya"));
        assert_eq!(review.app_version.as_deref(), Some("6.2.1"));
        assert_eq!(review.date.unwrap().timestamp(), 1767225600);
        assert!(review.title.is_none());
    }

    #[test]
    fn test_parse_batch_without_token() {
        let body = batch_body(json!([review_item("Ana", 5, "lovely", None)]), None);
        let page = parse_batch(&body, "Calm").unwrap();
        assert_eq!(page.reviews.len(), 1);
        assert!(page.next_token.is_none());
        assert!(page.reviews[0].app_version.is_none());
    }

    #[test]
    fn test_parse_batch_null_payload() {
        let outer = json!([["wrb.fr", RPC_ID, Value::Null, "generic"]]).to_string();
        let body = format!(")]}}'\n\n{}", outer);

        let page = parse_batch(&body, "Calm").unwrap();
        assert!(page.reviews.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_parse_batch_garbage() {
        assert!(parse_batch("no json here", "Calm").is_err());
        assert!(parse_batch(")]}'\n\n[broken", "Calm").is_err());
    }

    #[test]
    fn test_request_envelope_shape() {
        let envelope = request_envelope("com.calm.android", 150, None);
        let parsed: Value = serde_json::from_str(&envelope).unwrap();

        let call = parsed.get(0).and_then(|v| v.get(0)).unwrap();
        assert_eq!(call.get(0).and_then(Value::as_str), Some(RPC_ID));

        // The inner request is double-encoded.
        let inner: Value =
            serde_json::from_str(call.get(1).and_then(Value::as_str).unwrap()).unwrap();
        assert_eq!(
            inner.get(3).and_then(|v| v.get(0)).and_then(Value::as_str),
            Some("com.calm.android")
        );

        let with_token = request_envelope("com.calm.android", 100, Some("tok"));
        assert!(with_token.contains("tok"));
    }
}
