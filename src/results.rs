use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;
use crate::report::ComprehensiveReport;

/// Structured content extracted from a fetched page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedContent {
    /// URL the content was fetched from
    pub url: String,

    /// Page title (if available)
    pub title: Option<String>,

    /// Meta description (if available)
    pub meta_description: Option<String>,

    /// Visible text, truncated to the configured budget
    pub clean_text: String,

    /// h1-h3 headings in document order
    pub headings: Vec<String>,

    pub word_count: usize,
    pub image_count: usize,
    pub link_count: usize,

    /// Most frequent meaningful words
    pub extracted_keywords: Vec<String>,

    /// Raw link targets found on the page
    #[serde(default)]
    pub links: Vec<String>,
}

/// Business frameworks the site can be analysed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameworkKind {
    GoldenCircle,
    B2cElements,
    B2bElements,
    CliftonStrengths,
    RevenueTrends,
}

impl FrameworkKind {
    pub const ALL: [FrameworkKind; 5] = [
        FrameworkKind::GoldenCircle,
        FrameworkKind::B2cElements,
        FrameworkKind::B2bElements,
        FrameworkKind::CliftonStrengths,
        FrameworkKind::RevenueTrends,
    ];

    /// The four frameworks run when a request names none
    pub const DEFAULT: [FrameworkKind; 4] = [
        FrameworkKind::GoldenCircle,
        FrameworkKind::B2cElements,
        FrameworkKind::B2bElements,
        FrameworkKind::CliftonStrengths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkKind::GoldenCircle => "golden-circle",
            FrameworkKind::B2cElements => "b2c-elements",
            FrameworkKind::B2bElements => "b2b-elements",
            FrameworkKind::CliftonStrengths => "clifton-strengths",
            FrameworkKind::RevenueTrends => "revenue-trends",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FrameworkKind::GoldenCircle => "Golden Circle",
            FrameworkKind::B2cElements => "B2C Elements of Value",
            FrameworkKind::B2bElements => "B2B Elements of Value",
            FrameworkKind::CliftonStrengths => "CliftonStrengths",
            FrameworkKind::RevenueTrends => "Revenue Trends",
        }
    }
}

impl fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameworkKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        FrameworkKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                AnalysisError::invalid("INVALID_FRAMEWORK", format!("Unknown framework: {}", s))
            })
    }
}

/// Reason recorded for optional sources the request did not ask for
pub const NOT_REQUESTED: &str = "not requested";

/// Result of a data source that may legitimately be missing.
///
/// A failed or skipped lookup is `Unavailable` with a reason, so callers
/// never confuse "no data" with a real score of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Availability<T> {
    Available { value: T },
    Unavailable { reason: String },
}

impl<T> Availability<T> {
    pub fn available(value: T) -> Self {
        Availability::Available { value }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Availability::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Availability::Available { value } => Some(value),
            Availability::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Availability::Available { .. } => None,
            Availability::Unavailable { reason } => Some(reason),
        }
    }
}

impl<T> From<crate::error::Result<T>> for Availability<T> {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(value) => Availability::available(value),
            Err(e) => Availability::unavailable(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Outcome of checking a model reply against the fields a framework needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub missing_fields: Vec<String>,
    /// Percentage of required fields present
    pub score: u8,
}

/// Per-framework result with an explicit status tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkOutcome {
    pub framework: FrameworkKind,
    pub status: StepStatus,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub validation: Option<ValidationReport>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl FrameworkOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }
}

/// Lighthouse category scores on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseScores {
    pub performance: u8,
    pub accessibility: u8,
    pub best_practices: u8,
    pub seo: u8,
}

impl LighthouseScores {
    pub fn mean(&self) -> f64 {
        (self.performance as f64
            + self.accessibility as f64
            + self.best_practices as f64
            + self.seo as f64)
            / 4.0
    }

    /// Category name and score pairs, in report order
    pub fn categories(&self) -> [(&'static str, u8); 4] {
        [
            ("Performance", self.performance),
            ("Accessibility", self.accessibility),
            ("Best Practices", self.best_practices),
            ("SEO", self.seo),
        ]
    }
}

/// Search interest figures read from Google Trends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsSnapshot {
    pub keyword: String,
    pub interest_over_time: Vec<u32>,
    pub related_queries: Vec<String>,
}

/// Summary of one additional same-site page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub title: Option<String>,
    pub has_meta_description: bool,
    pub heading_count: usize,
    pub word_count: usize,
}

impl From<&ScrapedContent> for PageSummary {
    fn from(content: &ScrapedContent) -> Self {
        Self {
            title: content.title.clone(),
            has_meta_description: content.meta_description.is_some(),
            heading_count: content.headings.len(),
            word_count: content.word_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAudit {
    pub url: String,
    pub summary: Availability<PageSummary>,
}

/// Priority, effort and impact levels. Declared High first so that an
/// ascending sort puts the most important entries on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    /// Lenient parse of model-supplied level strings
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" | "urgent" => Some(Level::High),
            "medium" | "moderate" | "med" => Some(Level::Medium),
            "low" | "minor" => Some(Level::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Level,
    pub effort: Level,
    pub impact: Level,
    /// Where the recommendation came from (framework id, "seo", "content")
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    pub title: String,
    pub priority: Level,
    pub effort: Level,
    pub impact: Level,
    pub timeframe: String,
}

/// Everything produced by one comprehensive analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveAnalysisResult {
    pub url: String,
    pub keyword: Option<String>,
    pub content: ScrapedContent,
    pub frameworks: Vec<FrameworkOutcome>,
    pub lighthouse: Availability<LighthouseScores>,
    pub trends: Availability<TrendsSnapshot>,
    pub pages: Vec<PageAudit>,
    pub insights: Availability<Value>,
    pub report: ComprehensiveReport,
    pub generated_at: DateTime<Utc>,
}
