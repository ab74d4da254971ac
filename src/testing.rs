//! Hand-written test doubles with call counters.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::error::{AnalysisError, Result};
use crate::fetcher::ContentFetcher;
use crate::llm::LlmClient;
use crate::results::{Availability, LighthouseScores, ScrapedContent};
use crate::tools::MetricsSource;

/// Model double: canned reply, optional per-prompt overrides and delay
pub struct MockLlm {
    name: String,
    default: std::result::Result<String, String>,
    overrides: Vec<(String, std::result::Result<String, String>)>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    fn with_default(name: &str, default: std::result::Result<String, String>) -> Self {
        Self {
            name: name.to_string(),
            default,
            overrides: Vec::new(),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(name: &str, text: &str) -> Self {
        Self::with_default(name, Ok(text.to_string()))
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self::with_default(name, Err(message.to_string()))
    }

    /// Replies with `text` to prompts containing `needle`
    pub fn replying_when(mut self, needle: &str, text: &str) -> Self {
        self.overrides.push((needle.to_string(), Ok(text.to_string())));
        self
    }

    /// Fails prompts containing `needle`
    pub fn failing_when(mut self, needle: &str, message: &str) -> Self {
        self.overrides.push((needle.to_string(), Err(message.to_string())));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .overrides
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default);
        reply
            .clone()
            .map_err(|message| AnalysisError::provider(self.name.clone(), message))
    }
}

/// Fetcher double serving fixed content per URL
pub struct MockFetcher {
    pages: HashMap<String, ScrapedContent>,
    fallback: Option<ScrapedContent>,
    calls: AtomicUsize,
}

impl MockFetcher {
    /// Serves `content` for every URL
    pub fn returning(content: ScrapedContent) -> Self {
        Self {
            pages: HashMap::new(),
            fallback: Some(content),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every URL that has no page registered
    pub fn failing() -> Self {
        Self {
            pages: HashMap::new(),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_page(mut self, url: &str, content: ScrapedContent) -> Self {
        self.pages.insert(url.to_string(), content);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<ScrapedContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url.as_str())
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| AnalysisError::Fetch(format!("{} returned HTTP 404 Not Found", url)))
    }
}

/// Metrics double with a fixed answer
pub struct MockMetrics {
    name: String,
    answer: Availability<LighthouseScores>,
    calls: AtomicUsize,
}

impl MockMetrics {
    pub fn available(name: &str, scores: LighthouseScores) -> Self {
        Self {
            name: name.to_string(),
            answer: Availability::available(scores),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            answer: Availability::unavailable(reason),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSource for MockMetrics {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lighthouse(&self, _url: &str) -> Availability<LighthouseScores> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Content of a small marketing page
pub fn sample_content(url: &str) -> ScrapedContent {
    ScrapedContent {
        url: url.to_string(),
        title: Some("Acme Widgets".to_string()),
        meta_description: Some("Premium widgets that save time for busy teams".to_string()),
        clean_text: "We believe every team deserves calm. Acme widgets save time, integrate \
            with your tools and come with a lifetime guarantee. Join our community."
            .to_string(),
        headings: vec!["Calm teams".to_string(), "How it works".to_string()],
        word_count: 24,
        image_count: 3,
        link_count: 2,
        extracted_keywords: vec!["widgets".to_string(), "team".to_string()],
        links: vec!["/pricing".to_string(), "/about".to_string()],
    }
}
