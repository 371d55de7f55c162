//! Trustpilot connector.
//!
//! Trustpilot serves server-rendered HTML with the review payload embedded
//! in a `__NEXT_DATA__` script tag. The business unit's total review count
//! arrives with the first page and fixes the page count (20 reviews per
//! page). Unauthenticated scraping ends at a sign-up wall after roughly
//! 200 reviews; that wall is a recognized stop, not an error.

use super::{
    drain_pages, parse_rfc3339, ConnectorError, PageSource, PageStep, SourceConnector,
};
use crate::config::{AppEntry, ScrapeConfig};
use crate::models::{Review, ScrapeOutcome, Source, StopReason};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

const REVIEWS_PER_PAGE: u64 = 20;

pub struct TrustpilotConnector {
    client: reqwest::Client,
    delay_ms: u64,
}

impl TrustpilotConnector {
    pub fn new(client: reqwest::Client, cfg: &ScrapeConfig) -> Self {
        Self {
            client,
            delay_ms: cfg.delay_ms,
        }
    }
}

#[async_trait]
impl SourceConnector for TrustpilotConnector {
    fn source(&self) -> Source {
        Source::Trustpilot
    }

    async fn scrape(&self, app: &AppEntry) -> ScrapeOutcome {
        let mut pager = TrustpilotPager {
            conn: self,
            app,
            total_pages: None,
        };
        drain_pages(&mut pager, None, self.delay_ms).await
    }
}

struct TrustpilotPager<'a> {
    conn: &'a TrustpilotConnector,
    app: &'a AppEntry,
    /// Learned from the business unit on the first page.
    total_pages: Option<u32>,
}

#[async_trait]
impl PageSource for TrustpilotPager<'_> {
    async fn page(&mut self, page: u32) -> Result<PageStep, ConnectorError> {
        if let Some(total) = self.total_pages {
            if page > total {
                return Ok(PageStep::End(StopReason::Exhausted));
            }
        }

        let url = format!("{}?page={}", self.app.trustpilot_url, page);
        let response = self.conn.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ConnectorError::Status(response.status().as_u16()));
        }
        let html = response.text().await?;

        let payload = extract_next_data(&html)?;
        let parsed = parse_page(&payload, &self.app.company)?;

        if self.total_pages.is_none() {
            if let Some(total) = parsed.total_reviews {
                let pages = ((total + REVIEWS_PER_PAGE - 1) / REVIEWS_PER_PAGE).max(1) as u32;
                debug!(
                    "{}: {} reviews across {} Trustpilot pages",
                    self.app.company, total, pages
                );
                self.total_pages = Some(pages);
            }
        }

        if parsed.reviews.is_empty() && parsed.auth_wall {
            return Ok(PageStep::End(StopReason::AuthWall));
        }

        Ok(PageStep::Records(parsed.reviews))
    }
}

/// One parsed Trustpilot page.
#[derive(Debug)]
pub(crate) struct TrustpilotPage {
    pub reviews: Vec<Review>,
    pub total_reviews: Option<u64>,
    pub auth_wall: bool,
}

#[derive(Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Deserialize)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Deserialize)]
struct PageProps {
    #[serde(rename = "businessUnit")]
    business_unit: Option<BusinessUnit>,
    #[serde(default)]
    reviews: Vec<RawReview>,
    #[serde(rename = "isSignup")]
    is_signup: Option<serde_json::Value>,
    #[serde(rename = "redirectUrl")]
    redirect_url: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct BusinessUnit {
    #[serde(rename = "numberOfReviews")]
    number_of_reviews: Option<u64>,
}

#[derive(Deserialize)]
struct RawReview {
    rating: Option<u8>,
    text: Option<String>,
    dates: Option<ReviewDates>,
}

#[derive(Deserialize)]
struct ReviewDates {
    #[serde(rename = "publishedDate")]
    published: Option<String>,
    #[serde(rename = "experiencedDate")]
    experienced: Option<String>,
}

/// Pull the `__NEXT_DATA__` JSON out of the page HTML.
pub(crate) fn extract_next_data(html: &str) -> Result<String, ConnectorError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__").expect("valid selector");
    let node = document.select(&selector).next().ok_or_else(|| {
        ConnectorError::Malformed("page has no __NEXT_DATA__ script tag".to_string())
    })?;
    Ok(node.text().collect())
}

/// Parse the embedded JSON into reviews plus page metadata. Entries
/// without a rating or with an empty body are not reviews and are dropped.
pub(crate) fn parse_page(payload: &str, company: &str) -> Result<TrustpilotPage, ConnectorError> {
    let data: NextData = serde_json::from_str(payload)
        .map_err(|e| ConnectorError::Malformed(format!("embedded JSON: {}", e)))?;
    let props = data.props.page_props;

    let auth_wall = props.is_signup.is_some() || props.redirect_url.is_some();
    let total_reviews = props.business_unit.and_then(|b| b.number_of_reviews);

    let reviews = props
        .reviews
        .into_iter()
        .filter_map(|raw| {
            let rating = raw.rating?;
            let text = raw.text.filter(|t| !t.is_empty())?;
            let date = raw
                .dates
                .as_ref()
                .and_then(|d| d.published.as_deref().or(d.experienced.as_deref()))
                .and_then(parse_rfc3339);
            Some(Review {
                source: Source::Trustpilot,
                company: company.to_string(),
                rating: Some(rating),
                date,
                title: None,
                text,
                username: None,
                app_version: None,
            })
        })
        .collect();

    Ok(TrustpilotPage {
        reviews,
        total_reviews,
        auth_wall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_html(payload: &str) -> String {
        format!(
            "<html><head><title>Reviews</title></head><body>\
             <script id=\"__NEXT_DATA__\" type=\"application/json\">{}</script>\
             </body></html>",
            payload
        )
    }

    const NORMAL_PAGE: &str = r#"{
        "props": {
            "pageProps": {
                "businessUnit": {"numberOfReviews": 45},
                "reviews": [
                    {
                        "rating": 1,
                        "text": "Cannot cancel, awful",
                        "dates": {"publishedDate": "2026-03-01T10:00:00.000Z"}
                    },
                    {
                        "rating": 5,
                        "text": "Sleep stories are lovely",
                        "dates": {"experiencedDate": "2026-02-20T00:00:00.000Z"}
                    },
                    {"rating": 4, "text": "", "dates": null},
                    {"rating": null, "text": "not a review entry"}
                ]
            }
        }
    }"#;

    const WALL_PAGE: &str = r#"{
        "props": {
            "pageProps": {
                "isSignup": true,
                "reviews": []
            }
        }
    }"#;

    #[test]
    fn test_extract_next_data() {
        let html = page_html(r#"{"props": {"pageProps": {"reviews": []}}}"#);
        let payload = extract_next_data(&html).unwrap();
        assert!(payload.contains("pageProps"));
    }

    #[test]
    fn test_extract_missing_script_tag() {
        let err = extract_next_data("<html><body>nothing here</body></html>").unwrap_err();
        assert!(matches!(err, ConnectorError::Malformed(_)));
    }

    #[test]
    fn test_parse_normal_page() {
        let page = parse_page(NORMAL_PAGE, "Calm").unwrap();

        assert_eq!(page.total_reviews, Some(45));
        assert!(!page.auth_wall);
        // Entries without rating or body are dropped.
        assert_eq!(page.reviews.len(), 2);

        let first = &page.reviews[0];
        assert_eq!(first.source, Source::Trustpilot);
        assert_eq!(first.company, "Calm");
        assert_eq!(first.rating, Some(1));
        assert!(first.date.is_some());

        // experiencedDate is the fallback when publishedDate is absent.
        assert!(page.reviews[1].date.is_some());
    }

    #[test]
    fn test_parse_auth_wall_page() {
        let page = parse_page(WALL_PAGE, "Calm").unwrap();
        assert!(page.auth_wall);
        assert!(page.reviews.is_empty());
    }

    #[test]
    fn test_parse_garbage_payload() {
        let err = parse_page("<<not json>>", "Calm").unwrap_err();
        assert!(matches!(err, ConnectorError::Malformed(_)));
    }

    #[test]
    fn test_page_count_rounding() {
        // 45 reviews at 20 per page is 3 pages.
        let total: u64 = 45;
        assert_eq!((total + REVIEWS_PER_PAGE - 1) / REVIEWS_PER_PAGE, 3);
    }
}
