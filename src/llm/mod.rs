//! Model provider clients behind one JSON-generating interface.
//!
//! Gemini is the default primary provider and Claude the fallback. Both are
//! plain REST clients on `reqwest`; callers only see [`LlmClient`].

pub mod claude;
pub mod extract;
pub mod fallback;
pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ApiKeys, LlmConfig};
use crate::error::Result;

pub use claude::ClaudeClient;
pub use fallback::{FallbackClient, TimeoutClient};
pub use gemini::GeminiClient;

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    Claude,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Gemini => f.write_str("gemini"),
            LlmProvider::Claude => f.write_str("claude"),
        }
    }
}

/// Capability interface over every model provider
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name used in logs and error messages
    fn name(&self) -> &str;

    /// Sends a prompt and returns the raw text reply
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Sends a prompt asking for JSON of the given shape and extracts the
    /// object from the reply
    async fn generate_json(&self, prompt: &str, schema_hint: &str) -> Result<Value> {
        let prompt = with_schema_hint(prompt, schema_hint);
        let text = self.complete(&prompt).await?;
        extract::extract_json(&text)
    }
}

/// Appends the output contract unless the prompt already carries it
pub fn with_schema_hint(prompt: &str, schema_hint: &str) -> String {
    if schema_hint.trim().is_empty() || prompt.contains(schema_hint) {
        prompt.to_string()
    } else {
        format!(
            "{}\n\nRespond with ONLY a valid JSON object (no markdown, no commentary) matching this structure:\n{}",
            prompt, schema_hint
        )
    }
}

/// Shared HTTP client for provider calls
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// One provider, bounded by its own timeout so a hung primary still
/// leaves the fallback a full budget
fn provider_client(
    provider: LlmProvider,
    config: &LlmConfig,
    api_key: Option<String>,
    http: reqwest::Client,
) -> Arc<dyn LlmClient> {
    let client: Arc<dyn LlmClient> = match provider {
        LlmProvider::Gemini => {
            let mut client = GeminiClient::new(http, api_key, config.gemini_model.clone());
            if let Some(base) = &config.gemini_base_url {
                client = client.with_base_url(base);
            }
            Arc::new(client)
        }
        LlmProvider::Claude => {
            let mut client = ClaudeClient::new(http, api_key, config.claude_model.clone());
            if let Some(base) = &config.claude_base_url {
                client = client.with_base_url(base);
            }
            Arc::new(client)
        }
    };
    Arc::new(TimeoutClient::new(client, Duration::from_secs(config.timeout_secs)))
}

/// Wires the configured primary provider and the optional fallback into
/// one client. Each provider call carries its own timeout.
///
/// The fallback is only attached when its API key is configured. A missing
/// primary key is not an error here; calls fail with `MissingApiKey`.
pub fn build_client(config: &LlmConfig, keys: &ApiKeys, http: reqwest::Client) -> Arc<dyn LlmClient> {
    let primary_key = keys.for_provider(config.primary).map(str::to_string);
    if primary_key.is_none() {
        ::log::warn!("No API key configured for primary provider {}", config.primary);
    }
    let primary = provider_client(config.primary, config, primary_key, http.clone());

    let secondary = config
        .secondary
        .filter(|s| *s != config.primary)
        .and_then(|provider| {
            let key = keys.for_provider(provider)?;
            ::log::info!("Fallback provider {} is configured", provider);
            Some(provider_client(provider, config, Some(key.to_string()), http.clone()))
        });

    Arc::new(FallbackClient::new(primary, secondary))
}
