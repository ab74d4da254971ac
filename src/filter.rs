use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::error::{AnalysisError, Result};

/// Static assets that are never analysed as pages
static ASSET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|css|js|ico|svg|woff|woff2|ttf|eot|pdf|zip|mp4|mp3)$")
        .unwrap_or_else(|e| panic!("invalid built-in asset pattern: {e}"))
});

/// Validates a user-supplied target URL before any network call is made
pub fn validate_target_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::invalid("MISSING_URL", "A url is required"));
    }

    let url = Url::parse(trimmed).map_err(|e| {
        AnalysisError::invalid("INVALID_URL", format!("Invalid URL '{}': {}", trimmed, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AnalysisError::invalid(
            "INVALID_URL",
            format!("Unsupported URL scheme '{}', expected http or https", url.scheme()),
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(AnalysisError::invalid("INVALID_URL", "URL has no host"));
    }

    if ASSET_PATTERN.is_match(url.path()) {
        return Err(AnalysisError::invalid(
            "INVALID_URL",
            format!("{} points at a static asset, not a page", url),
        ));
    }

    Ok(url)
}

/// Configuration for deciding which discovered links belong to the analysed site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Host the links must stay on ("www." prefixes are ignored)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_domain: Option<String>,

    /// Regex patterns for URLs to include (if empty, all URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl UrlFilterConfig {
    /// Same-site scope for the given root page
    pub fn same_site(root: &Url) -> Self {
        Self {
            required_domain: root.host_str().map(|h| h.to_string()),
            include_patterns: Vec::new(),
            exclude_patterns: vec![
                ASSET_PATTERN.to_string(),
                r"(?i)/(login|logout|signin|signup|cart|checkout|wp-admin)(/|$)".to_string(),
            ],
        }
    }
}

/// URL filter that uses regex patterns and domain scope
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    pub fn new(config: UrlFilterConfig) -> std::result::Result<Self, regex::Error> {
        let include_regexes = config
            .include_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let exclude_regexes = config
            .exclude_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            include_regexes,
            exclude_regexes,
        })
    }

    /// Whether a resolved link is a page of the analysed site
    pub fn accepts(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        if !self.is_in_domain_scope(url) {
            return false;
        }

        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|r| r.is_match(url_str)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|r| r.is_match(url_str))
    }

    fn is_in_domain_scope(&self, url: &Url) -> bool {
        match (&self.config.required_domain, url.host_str()) {
            (None, _) => true,
            (Some(required), Some(host)) => strip_www(required) == strip_www(host),
            (Some(_), None) => false,
        }
    }

    /// Removes the fragment and a trailing slash so equivalent links dedupe
    pub fn normalize_url(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        if normalized.path().len() > 1 && normalized.path().ends_with('/') {
            let trimmed = normalized.path().trim_end_matches('/').to_string();
            normalized.set_path(&trimmed);
        }
        normalized
    }

    /// Resolves raw hrefs against `base` and returns up to `max` distinct
    /// same-site pages, excluding the base page itself
    pub fn discover_pages(&self, base: &Url, links: &[String], max: usize) -> Vec<Url> {
        let mut seen = HashSet::new();
        seen.insert(self.normalize_url(base).to_string());

        let mut pages = Vec::new();
        for link in links {
            if pages.len() >= max {
                break;
            }
            let Ok(resolved) = base.join(link) else {
                ::log::trace!("Skipping unresolvable link: {}", link);
                continue;
            };
            if !self.accepts(&resolved) {
                ::log::trace!("URL filter rejected: {}", resolved);
                continue;
            }
            let normalized = self.normalize_url(&resolved);
            if seen.insert(normalized.to_string()) {
                ::log::debug!("Discovered same-site page: {}", normalized);
                pages.push(normalized);
            }
        }
        pages
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
