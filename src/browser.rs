//! Owned WebDriver session.
//!
//! Whoever connects owns the handle and passes it to the code that needs a
//! browser. Page access is serialised so one request never tears down a page
//! another request is still reading.

use fantoccini::{Client, ClientBuilder};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{AnalysisError, Result};

/// Common WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_URLS: [&str; 2] = [
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Selenium with IP instead of localhost
];

const BLANK_PAGE: &str = "about:blank";

pub struct BrowserSession {
    client: Mutex<Client>,
    endpoint: String,
    navigation_timeout: Duration,
}

impl BrowserSession {
    /// Connects to the WebDriver at `webdriver_url`, then to the common
    /// fallbacks
    pub async fn connect(webdriver_url: &str) -> Result<Self> {
        let mut last_error = match ClientBuilder::native().connect(webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                return Ok(Self::from_client(client, webdriver_url));
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
                e.to_string()
            }
        };

        for url in FALLBACK_URLS {
            if url == webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            match ClientBuilder::native().connect(url).await {
                Ok(client) => {
                    ::log::debug!("Connected to fallback WebDriver at {}", url);
                    return Ok(Self::from_client(client, url));
                }
                Err(e) => last_error = e.to_string(),
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(AnalysisError::Browser(format!(
            "could not connect to any WebDriver server ({})",
            last_error
        )))
    }

    fn from_client(client: Client, endpoint: &str) -> Self {
        Self {
            client: Mutex::new(client),
            endpoint: endpoint.to_string(),
            navigation_timeout: Duration::from_secs(45),
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// WebDriver URL the session is connected to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Navigates to `url` and runs `work` against the loaded page.
    ///
    /// Loading and `work` each get the navigation timeout, so a stuck page
    /// cannot hold the session lock. The page is released (navigated to `about:blank`) whether `work`
    /// succeeds or fails.
    pub async fn with_page<T, F, Fut>(&self, url: &str, work: F) -> Result<T>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let client = self.client.lock().await;
        ::log::debug!("Browser navigating to {}", url);

        let loaded = within(
            self.navigation_timeout,
            || format!("navigating to {}", url),
            async { client.goto(url).await.map_err(|e| navigation_error(e, url)) },
        )
        .await;
        let result = match loaded {
            Ok(()) => {
                within(
                    self.navigation_timeout,
                    || format!("reading {}", url),
                    work(client.clone()),
                )
                .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = client.goto(BLANK_PAGE).await {
            ::log::warn!("Failed to release page {}: {}", url, e);
        }
        result
    }

    /// Page source after JavaScript has run
    pub async fn page_source(&self, url: &str) -> Result<String> {
        self.with_page(url, |client| async move {
            client
                .source()
                .await
                .map_err(|e| AnalysisError::Browser(format!("reading source of {}: {}", url, e)))
        })
        .await
    }

    /// Ends the WebDriver session
    pub async fn close(self) -> Result<()> {
        let client = self.client.into_inner();
        client
            .close()
            .await
            .map_err(|e| AnalysisError::Browser(format!("closing session: {}", e)))
    }
}

/// Runs `task` under `limit`, reporting expiry as a timeout of `operation`
async fn within<T, Fut>(
    limit: Duration,
    operation: impl FnOnce() -> String,
    task: Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, task).await {
        Ok(result) => result,
        Err(_) => Err(AnalysisError::Timeout {
            operation: operation(),
            seconds: limit.as_secs(),
        }),
    }
}

fn navigation_error(error: fantoccini::error::CmdError, url: &str) -> AnalysisError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while accessing {}", url);
    } else {
        ::log::error!("Failed to access {}: {}", url, error);
    }
    AnalysisError::Browser(format!("accessing {}: {}", url, error))
}
