use thiserror::Error;

/// Errors raised while analysing a site
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{message}")]
    InvalidInput { code: &'static str, message: String },

    #[error("Failed to scrape website content: {0}")]
    Fetch(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error: {message}")]
    Provider { provider: String, message: String },

    #[error("No API key configured for {0}")]
    MissingApiKey(String),

    #[error("Failed to parse model response: {0}")]
    Parse(String),

    #[error("Model declined to produce JSON: {0}")]
    ModelRefused(String),

    #[error("{operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("External tool failed: {0}")]
    Tool(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Shorthand for an input validation failure
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code,
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { code, .. } => code,
            Self::Fetch(_) => "SCRAPE_FAILED",
            Self::Http(_) => "HTTP_ERROR",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::MissingApiKey(_) => "MISSING_API_KEY",
            Self::Parse(_) => "PARSE_ERROR",
            Self::ModelRefused(_) => "MODEL_REFUSED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Browser(_) => "BROWSER_ERROR",
            Self::Tool(_) => "TOOL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Whether the caller is at fault (maps to HTTP 400)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_client_errors() {
        let err = AnalysisError::invalid("INVALID_URL", "not a url");
        assert_eq!(err.code(), "INVALID_URL");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "not a url");

        let err = AnalysisError::Fetch("status 404".to_string());
        assert_eq!(err.code(), "SCRAPE_FAILED");
        assert!(!err.is_client_error());
        assert!(err.to_string().starts_with("Failed to scrape website content"));
    }
}
