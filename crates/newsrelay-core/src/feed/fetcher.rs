use bytes::Bytes;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;
use url::Url;

use super::models::FeedSnapshot;
use super::parser::parse_news_list;
use super::FeedSource;
use crate::config::FeedConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 2 * 1024 * 1024;
const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP client for the team news list
pub struct FeedFetcher {
    client: Client,
    base_url: Url,
}

impl FeedFetcher {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Self::build_client(config.request_timeout_secs, &config.proxy_url)?;
        let base_url = Url::parse(&config.base_url)?;

        Ok(Self { client, base_url })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    /// The list endpoint serves JSON to requests that look like its own web page
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        if let Ok(referer) = HeaderValue::from_str(self.base_url.origin().ascii_serialization().as_str()) {
            headers.insert(REFERER, referer);
        }
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers
    }

    /// Request URL for one team and one day
    pub fn list_url(&self, team: &str, date: NaiveDate) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("type", "team")
            .append_pair("team", team)
            .append_pair("isphoto", "N")
            .append_pair("date", &date.format("%Y%m%d").to_string());
        url
    }

    /// Fetch with retry and exponential backoff on 429/503 and transport errors
    async fn fetch_with_retry(&self, url: &Url) -> Result<(StatusCode, Bytes)> {
        let mut last_error = None;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        for attempt in 0..MAX_RETRIES {
            tracing::debug!("Fetch attempt {} for {}", attempt + 1, url);

            match self.client.get(url.clone()).headers(self.build_headers()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        tracing::warn!(
                            "Received {} for {}, retrying after {}ms...",
                            status,
                            url,
                            delay_ms
                        );
                        last_error = Some(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
                    } else {
                        match response.bytes().await {
                            Ok(bytes) => return Ok((status, bytes)),
                            Err(e) => {
                                tracing::warn!("Failed to read response body: {}", e);
                                last_error = Some(Error::Http(e));
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Request failed for {} (attempt {}): {}", url, attempt + 1, e);
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt < MAX_RETRIES - 1 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::FeedParse(format!("Failed to fetch URL after {} retries: {}", MAX_RETRIES, url))
        }))
    }

    fn ensure_content_size(&self, size: usize, url: &Url) -> Result<()> {
        if size > MAX_FEED_BYTES {
            return Err(Error::FeedParse(format!(
                "Response too large ({} bytes) for URL: {}",
                size, url
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch(&self, team: &str, date: NaiveDate) -> Result<FeedSnapshot> {
        let url = self.list_url(team, date);
        tracing::info!("Fetching {} news for {}", team, date);

        let (status, content) = self.fetch_with_retry(&url).await?;

        if !status.is_success() {
            return Err(Error::FeedParse(format!("HTTP {} for URL: {}", status, url)));
        }

        self.ensure_content_size(content.len(), &url)?;

        let snapshot = parse_news_list(&content, date)?;
        tracing::debug!("Fetched {} articles for {} on {}", snapshot.len(), team, date);
        Ok(snapshot)
    }
}
