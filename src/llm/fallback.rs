use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AnalysisError, Result};
use crate::llm::LlmClient;

/// Tries the primary provider, then the secondary one if it is configured
pub struct FallbackClient {
    primary: Arc<dyn LlmClient>,
    secondary: Option<Arc<dyn LlmClient>>,
    name: String,
}

impl FallbackClient {
    pub fn new(primary: Arc<dyn LlmClient>, secondary: Option<Arc<dyn LlmClient>>) -> Self {
        let name = match &secondary {
            Some(secondary) => format!("{}+{}", primary.name(), secondary.name()),
            None => primary.name().to_string(),
        };
        Self {
            primary,
            secondary,
            name,
        }
    }

    fn both_failed(&self, secondary: &dyn LlmClient, first: AnalysisError, second: AnalysisError) -> AnalysisError {
        ::log::error!(
            "Fallback provider {} also failed: {}",
            secondary.name(),
            second
        );
        AnalysisError::provider(
            self.name.clone(),
            format!(
                "{} failed ({}); {} failed ({})",
                self.primary.name(),
                first,
                secondary.name(),
                second
            ),
        )
    }
}

#[async_trait]
impl LlmClient for FallbackClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let first = match self.primary.complete(prompt).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        let Some(secondary) = &self.secondary else {
            return Err(first);
        };

        ::log::warn!(
            "Primary provider {} failed ({}), falling back to {}",
            self.primary.name(),
            first,
            secondary.name()
        );
        match secondary.complete(prompt).await {
            Ok(text) => Ok(text),
            Err(second) => Err(self.both_failed(secondary.as_ref(), first, second)),
        }
    }

    async fn generate_json(&self, prompt: &str, schema_hint: &str) -> Result<Value> {
        let first = match self.primary.generate_json(prompt, schema_hint).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let Some(secondary) = &self.secondary else {
            return Err(first);
        };

        ::log::warn!(
            "Primary provider {} failed ({}), falling back to {}",
            self.primary.name(),
            first,
            secondary.name()
        );
        match secondary.generate_json(prompt, schema_hint).await {
            Ok(value) => Ok(value),
            Err(second) => Err(self.both_failed(secondary.as_ref(), first, second)),
        }
    }
}

/// Bounds every call of the wrapped client.
///
/// On expiry the inner future is dropped, which aborts the HTTP request.
pub struct TimeoutClient {
    inner: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl TimeoutClient {
    pub fn new(inner: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn expired(&self) -> AnalysisError {
        ::log::warn!(
            "{} call exceeded {:?}, abandoning request",
            self.inner.name(),
            self.timeout
        );
        AnalysisError::Timeout {
            operation: format!("{} model call", self.inner.name()),
            seconds: self.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl LlmClient for TimeoutClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        tokio::time::timeout(self.timeout, self.inner.complete(prompt))
            .await
            .map_err(|_| self.expired())?
    }

    async fn generate_json(&self, prompt: &str, schema_hint: &str) -> Result<Value> {
        tokio::time::timeout(self.timeout, self.inner.generate_json(prompt, schema_hint))
            .await
            .map_err(|_| self.expired())?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlm;
    use serde_json::json;

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = Arc::new(MockLlm::replying("gemini", r#"{"from": "primary"}"#));
        let secondary = Arc::new(MockLlm::replying("claude", r#"{"from": "secondary"}"#));
        let client = FallbackClient::new(primary.clone(), Some(secondary.clone()));

        let value = client.generate_json("p", "").await.unwrap();
        assert_eq!(value, json!({"from": "primary"}));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
        assert_eq!(client.name(), "gemini+claude");
    }

    #[tokio::test]
    async fn test_primary_failure_uses_secondary() {
        let primary = Arc::new(MockLlm::failing("gemini", "503 unavailable"));
        let secondary = Arc::new(MockLlm::replying("claude", r#"{"from": "secondary"}"#));
        let client = FallbackClient::new(primary.clone(), Some(secondary.clone()));

        let value = client.generate_json("p", "").await.unwrap();
        assert_eq!(value, json!({"from": "secondary"}));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_primary_reply_uses_secondary() {
        let primary = Arc::new(MockLlm::replying("gemini", "I cannot help with that."));
        let secondary = Arc::new(MockLlm::replying("claude", r#"{"ok": 1}"#));
        let client = FallbackClient::new(primary, Some(secondary));

        assert_eq!(client.generate_json("p", "").await.unwrap(), json!({"ok": 1}));
    }

    #[tokio::test]
    async fn test_without_secondary_original_error_propagates() {
        let primary = Arc::new(MockLlm::failing("gemini", "quota exceeded"));
        let client = FallbackClient::new(primary, None);

        let err = client.complete("p").await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(client.name(), "gemini");
    }

    #[tokio::test]
    async fn test_both_failing_reports_both() {
        let client = FallbackClient::new(
            Arc::new(MockLlm::failing("gemini", "first boom")),
            Some(Arc::new(MockLlm::failing("claude", "second boom"))),
        );
        let err = client.complete("p").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("first boom"));
        assert!(message.contains("second boom"));
    }

    #[tokio::test]
    async fn test_timeout_abandons_slow_call() {
        let slow = Arc::new(
            MockLlm::replying("gemini", r#"{"late": true}"#).with_delay(Duration::from_secs(5)),
        );
        let client = TimeoutClient::new(slow, Duration::from_millis(50));

        let err = client.generate_json("p", "").await.unwrap_err();
        assert_eq!(err.code(), "TIMEOUT");
    }

    #[tokio::test]
    async fn test_timeout_passes_fast_calls_through() {
        let fast = Arc::new(MockLlm::replying("gemini", r#"{"on_time": true}"#));
        let client = TimeoutClient::new(fast, Duration::from_secs(5));
        assert_eq!(
            client.generate_json("p", "").await.unwrap(),
            json!({"on_time": true})
        );
    }
}
