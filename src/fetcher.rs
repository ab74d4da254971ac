//! Content fetchers: plain HTTP and JavaScript-rendered via WebDriver.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::browser::BrowserSession;
use crate::config::FetchConfig;
use crate::error::{AnalysisError, Result};
use crate::parsers;
use crate::results::ScrapedContent;

/// Source of structured page content
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<ScrapedContent>;
}

/// Fetches pages with a single GET request. No retries.
pub struct HttpFetcher {
    client: Client,
    max_chars: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_chars: config.max_chars,
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<ScrapedContent> {
        let started = std::time::Instant::now();
        ::log::info!("Fetching {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            ::log::error!("Request to {} failed: {}", url, e);
            AnalysisError::Fetch(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            ::log::warn!("{} answered with {}", url, status);
            return Err(AnalysisError::Fetch(format!("{} returned HTTP {}", url, status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AnalysisError::Fetch(format!("reading body of {}: {}", url, e)))?;

        let content = parsers::extract_page(&html, url.as_str(), self.max_chars);
        ::log::debug!(
            "Fetched {} in {:.2} seconds: {} words, {} links",
            url,
            started.elapsed().as_secs_f64(),
            content.word_count,
            content.link_count
        );
        Ok(content)
    }
}

/// Fetches pages through a WebDriver session so client-side rendering runs
pub struct BrowserFetcher {
    session: Arc<BrowserSession>,
    max_chars: usize,
}

impl BrowserFetcher {
    pub fn new(session: Arc<BrowserSession>, max_chars: usize) -> Self {
        Self { session, max_chars }
    }
}

#[async_trait]
impl ContentFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> Result<ScrapedContent> {
        ::log::info!("Rendering {} in browser", url);
        let html = self
            .session
            .page_source(url.as_str())
            .await
            .map_err(|e| AnalysisError::Fetch(e.to_string()))?;
        Ok(parsers::extract_page(&html, url.as_str(), self.max_chars))
    }
}
