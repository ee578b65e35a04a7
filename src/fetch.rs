//! HTTP access to the collection site and the movie detail fetcher.

use crate::PageFetcher;
use crate::error::FetchError;
use crate::extract::extract_movie_detail;
use crate::item::MovieDetail;
use reqwest::{Client, header};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, warn};

pub const USER_AGENT: &str = "Mozilla/5.0";

/// Courtesy delays between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Waited before every detail-page request, including the first.
    pub detail_delay: Duration,
    /// Waited between listing pages.
    pub page_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            detail_delay: Duration::from_millis(800),
            page_delay: Duration::from_millis(1300),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            detail_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
        }
    }
}

/// Fetches pages with the user's session cookie.
pub struct HttpFetcher {
    client: Client,
    cookie: String,
}

impl HttpFetcher {
    pub fn new(cookie: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            cookie: cookie.into(),
        })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .header(header::COOKIE, self.cookie.as_str())
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}

/// Fetch and parse one movie's detail page.
///
/// Never fails: a fetch error is logged and yields an empty detail, which
/// overlays nothing onto the item.
pub async fn fetch_movie_detail(fetcher: &dyn PageFetcher, link: &str, pacing: &Pacing) -> MovieDetail {
    tokio::time::sleep(pacing.detail_delay).await;
    match fetcher.fetch_page(link).await {
        Ok(html) => {
            let doc = Html::parse_document(&html);
            extract_movie_detail(&doc.root_element())
        }
        Err(e) => {
            warn!("Failed to fetch movie detail {}: {}", link, e);
            MovieDetail::default()
        }
    }
}
