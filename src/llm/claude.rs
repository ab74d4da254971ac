use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::llm::LlmClient;
use crate::parsers::text::truncate_chars;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_TEMPERATURE: f32 = 0.4;

/// Calculate appropriate max_tokens for a given model
fn max_tokens_for_model(model: &str) -> u32 {
    if model.contains("haiku") {
        4096
    } else {
        8192
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Client for the Anthropic messages API
pub struct ClaudeClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(client: Client, api_key: Option<String>, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for ClaudeClient {
    fn name(&self) -> &str {
        "claude"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::MissingApiKey("claude".to_string()))?;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: max_tokens_for_model(&self.model),
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        ::log::info!(
            "Making Claude API request: model={}, max_tokens={}",
            request.model,
            request.max_tokens
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ::log::error!("Claude API request timed out");
                } else {
                    ::log::error!("Claude API request failed: {}", e);
                }
                AnalysisError::provider("claude", format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            ::log::error!("Claude API error: {} - {}", status, truncate_chars(&body, 300));
            return Err(AnalysisError::provider(
                "claude",
                format!("API returned {}: {}", status, truncate_chars(&body, 300)),
            ));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::provider("claude", format!("invalid response body: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            ::log::debug!(
                "Claude usage: input={}, output={}",
                usage.input_tokens,
                usage.output_tokens
            );
        }

        let text = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(AnalysisError::provider("claude", "response contained no text"));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_complete_sends_headers_and_reads_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "c-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-test",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "content": [
                    {"type": "text", "text": "{\"ok\": "},
                    {"type": "tool_use", "id": "t"},
                    {"type": "text", "text": "true}"}
                ],
                "usage": {"input_tokens": 3, "output_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let claude = ClaudeClient::new(
            Client::new(),
            Some("c-key".to_string()),
            "claude-test".to_string(),
        )
        .with_base_url(&server.uri());

        let text = claude.complete("hello").await.unwrap();
        assert_eq!(text, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_server_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let claude = ClaudeClient::new(Client::new(), Some("k".to_string()), "m".to_string())
            .with_base_url(&server.uri());
        let err = claude.generate_json("x", "{}").await.unwrap_err();
        assert_eq!(err.code(), "PROVIDER_ERROR");
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_max_tokens_for_model() {
        assert_eq!(max_tokens_for_model("claude-3-haiku-20240307"), 4096);
        assert_eq!(max_tokens_for_model("claude-3-5-sonnet-20241022"), 8192);
    }
}
