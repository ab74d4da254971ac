//! External performance and search tooling.
//!
//! Every source reports `Availability`: a failed or unconfigured tool is
//! `Unavailable` with a reason, never a zeroed score.

pub mod lighthouse;
pub mod pagespeed;
pub mod script;
pub mod trends;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AnalysisError, Result};
use crate::results::{Availability, LighthouseScores, TrendsSnapshot};

pub use lighthouse::LocalLighthouse;
pub use pagespeed::PageSpeedClient;
pub use trends::TrendsProbe;

/// Source of Lighthouse category scores for a page
#[async_trait]
pub trait MetricsSource: Send + Sync {
    fn name(&self) -> &str;

    async fn lighthouse(&self, url: &str) -> Availability<LighthouseScores>;
}

/// Source of search interest for a keyword
#[async_trait]
pub trait TrendsSource: Send + Sync {
    async fn interest(&self, keyword: &str) -> Availability<TrendsSnapshot>;
}

/// Asks each source in turn and returns the first available scores
pub struct FirstAvailable {
    sources: Vec<Arc<dyn MetricsSource>>,
}

impl FirstAvailable {
    pub fn new(sources: Vec<Arc<dyn MetricsSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl MetricsSource for FirstAvailable {
    fn name(&self) -> &str {
        "metrics"
    }

    async fn lighthouse(&self, url: &str) -> Availability<LighthouseScores> {
        let mut reasons = Vec::new();
        for source in &self.sources {
            match source.lighthouse(url).await {
                Availability::Available { value } => return Availability::available(value),
                Availability::Unavailable { reason } => {
                    ::log::info!("{} unavailable for {}: {}", source.name(), url, reason);
                    reasons.push(format!("{}: {}", source.name(), reason));
                }
            }
        }
        if reasons.is_empty() {
            Availability::unavailable("no metrics source configured")
        } else {
            Availability::unavailable(reasons.join("; "))
        }
    }
}

const CATEGORIES: [&str; 4] = ["performance", "accessibility", "best-practices", "seo"];

/// Reads `categories.<name>.score` (0..1) from a Lighthouse report into
/// 0-100 scores. A missing or null category score is an error.
pub fn parse_categories(report: &Value) -> Result<LighthouseScores> {
    let categories = report
        .get("categories")
        .ok_or_else(|| AnalysisError::Tool("report has no categories".to_string()))?;

    let mut scores = [0u8; 4];
    for (slot, name) in scores.iter_mut().zip(CATEGORIES) {
        let score = categories
            .get(name)
            .and_then(|c| c.get("score"))
            .and_then(Value::as_f64)
            .ok_or_else(|| AnalysisError::Tool(format!("report has no {} score", name)))?;
        *slot = (score.clamp(0.0, 1.0) * 100.0).round() as u8;
    }

    Ok(LighthouseScores {
        performance: scores[0],
        accessibility: scores[1],
        best_practices: scores[2],
        seo: scores[3],
    })
}
