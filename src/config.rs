use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::llm::LlmProvider;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub webdriver: WebDriverConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address the HTTP API binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Settings for fetching the target page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// Character budget for extracted page text
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default = "default_primary")]
    pub primary: LlmProvider,

    /// Provider tried when the primary fails; `None` disables fallback
    #[serde(default = "default_secondary")]
    pub secondary: Option<LlmProvider>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_claude_model")]
    pub claude_model: String,

    /// Upper bound for a single model call
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Base URL overrides, mostly for tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    /// PageSpeed Insights strategy (mobile or desktop)
    #[serde(default = "default_pagespeed_strategy")]
    pub pagespeed_strategy: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagespeed_base_url: Option<String>,

    /// Hard limit for local tool runs
    #[serde(default = "default_script_timeout")]
    pub script_timeout_secs: u64,

    /// Maximum captured stdout size for local tool runs
    #[serde(default = "default_script_max_output")]
    pub script_max_output_bytes: usize,

    /// Local Lighthouse CLI; when set it is used instead of PageSpeed Insights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighthouse_command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDriverConfig {
    #[serde(default = "default_webdriver_url")]
    pub url: String,
    /// Budget for loading a page and for the work done on it
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Budget for a whole comprehensive run
    #[serde(default = "default_deadline")]
    pub deadline_secs: u64,

    /// Maximum number of extra pages audited with includeAllPages
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_chars() -> usize {
    8000
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("brandscope/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_primary() -> LlmProvider {
    LlmProvider::Gemini
}

fn default_secondary() -> Option<LlmProvider> {
    Some(LlmProvider::Claude)
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_claude_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_pagespeed_strategy() -> String {
    "mobile".to_string()
}

fn default_script_timeout() -> u64 {
    300
}

fn default_script_max_output() -> usize {
    10 * 1024 * 1024
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_navigation_timeout() -> u64 {
    45
}

fn default_deadline() -> u64 {
    300
}

fn default_max_pages() -> usize {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            secondary: default_secondary(),
            gemini_model: default_gemini_model(),
            claude_model: default_claude_model(),
            timeout_secs: default_llm_timeout(),
            gemini_base_url: None,
            claude_base_url: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pagespeed_strategy: default_pagespeed_strategy(),
            pagespeed_base_url: None,
            script_timeout_secs: default_script_timeout(),
            script_max_output_bytes: default_script_max_output(),
            lighthouse_command: None,
        }
    }
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            navigation_timeout_secs: default_navigation_timeout(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline(),
            max_pages: default_max_pages(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// Apply environment overrides that are not secrets
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WEBDRIVER_URL").filter(|u| !u.trim().is_empty()) {
            self.webdriver.url = url;
        }
        self
    }
}

/// API keys read from the environment.
///
/// Empty and placeholder values are treated as absent.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub gemini: Option<String>,
    pub claude: Option<String>,
    pub google: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("gemini", &self.gemini.is_some())
            .field("claude", &self.claude.is_some())
            .field("google", &self.google.is_some())
            .finish()
    }
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            let value = lookup(name)?;
            if is_placeholder_key(&value) {
                ::log::warn!("{} is set to a placeholder value, ignoring it", name);
                None
            } else {
                Some(value.trim().to_string())
            }
        };

        Self {
            gemini: read("GEMINI_API_KEY"),
            claude: read("CLAUDE_API_KEY"),
            google: read("GOOGLE_API_KEY"),
        }
    }

    pub fn for_provider(&self, provider: LlmProvider) -> Option<&str> {
        match provider {
            LlmProvider::Gemini => self.gemini.as_deref(),
            LlmProvider::Claude => self.claude.as_deref(),
        }
    }
}

/// Whether a key value is empty or an obvious template placeholder
pub fn is_placeholder_key(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    v.is_empty()
        || v == "changeme"
        || v.contains("placeholder")
        || (v.starts_with("your_") || v.starts_with("your-"))
        || v.ends_with("_here")
        || v.chars().all(|c| c == 'x')
}
