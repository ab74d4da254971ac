use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AnalysisError, Result};
use crate::parsers::text::truncate_chars;
use crate::results::{Availability, LighthouseScores};
use crate::tools::{MetricsSource, parse_categories};

const PAGESPEED_API_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// PageSpeed Insights REST client
pub struct PageSpeedClient {
    client: Client,
    api_key: Option<String>,
    strategy: String,
    endpoint: String,
}

impl PageSpeedClient {
    pub fn new(client: Client, api_key: Option<String>, strategy: &str) -> Self {
        Self {
            client,
            api_key,
            strategy: strategy.to_string(),
            endpoint: PAGESPEED_API_URL.to_string(),
        }
    }

    /// Overrides the full runPagespeed endpoint
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub async fn scores(&self, url: &str) -> Availability<LighthouseScores> {
        let Some(key) = self.api_key.as_deref() else {
            return Availability::unavailable("GOOGLE_API_KEY is not configured");
        };
        match self.run(url, key).await {
            Ok(scores) => {
                ::log::info!("PageSpeed scores for {}: {:?}", url, scores);
                Availability::available(scores)
            }
            Err(e) => {
                ::log::warn!("PageSpeed lookup for {} failed: {}", url, e);
                Availability::unavailable(e.to_string())
            }
        }
    }

    async fn run(&self, url: &str, key: &str) -> Result<LighthouseScores> {
        let query = [
            ("url", url),
            ("category", "performance"),
            ("category", "accessibility"),
            ("category", "best-practices"),
            ("category", "seo"),
            ("strategy", self.strategy.as_str()),
            ("key", key),
        ];
        let response = self.client.get(&self.endpoint).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Tool(format!(
                "PageSpeed returned {}: {}",
                status,
                truncate_chars(&body, 300)
            )));
        }

        let body: Value = response.json().await?;
        let report = body
            .get("lighthouseResult")
            .ok_or_else(|| AnalysisError::Tool("PageSpeed response has no lighthouseResult".to_string()))?;
        parse_categories(report)
    }
}

#[async_trait]
impl MetricsSource for PageSpeedClient {
    fn name(&self) -> &str {
        "pagespeed"
    }

    async fn lighthouse(&self, url: &str) -> Availability<LighthouseScores> {
        self.scores(url).await
    }
}
