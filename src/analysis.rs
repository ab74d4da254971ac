//! Per-framework analysis: prompt, model call, normalisation, validation.

use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{AnalysisError, Result};
use crate::frameworks::elements::ElementsTally;
use crate::frameworks::{self, keyword_signals};
use crate::llm::LlmClient;
use crate::prompts::framework_prompt;
use crate::results::{FrameworkKind, FrameworkOutcome, ScrapedContent, StepStatus, ValidationReport};

/// Fields a usable reply must carry, per framework
pub fn required_fields(kind: FrameworkKind) -> &'static [&'static str] {
    match kind {
        FrameworkKind::GoldenCircle => &["why", "how", "what", "who", "overallScore"],
        FrameworkKind::B2cElements | FrameworkKind::B2bElements => {
            &["elements", "presentElements", "missingElements", "overallScore"]
        }
        FrameworkKind::CliftonStrengths => &["topThemes", "domainScores", "overallScore"],
        FrameworkKind::RevenueTrends => &["revenueModel", "signals", "overallScore"],
    }
}

fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Checks a reply against the fields its framework requires
pub fn validate(kind: FrameworkKind, data: &Value) -> ValidationReport {
    let required = required_fields(kind);
    let missing_fields: Vec<String> = required
        .iter()
        .filter(|field| !is_filled(data.get(**field)))
        .map(|field| field.to_string())
        .collect();
    let present = required.len() - missing_fields.len();
    let score = (present as f64 * 100.0 / required.len() as f64).round() as u8;

    ValidationReport {
        is_valid: missing_fields.is_empty(),
        missing_fields,
        score,
    }
}

/// Runs framework analyses against one model client
pub struct FrameworkAnalyzer {
    llm: Arc<dyn LlmClient>,
    max_chars: usize,
}

impl FrameworkAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, max_chars: usize) -> Self {
        Self { llm, max_chars }
    }

    /// Analyses one framework. Failures are reported in the outcome.
    pub async fn analyze(
        &self,
        kind: FrameworkKind,
        content: &ScrapedContent,
        keyword: Option<&str>,
    ) -> FrameworkOutcome {
        let started = Instant::now();
        ::log::info!("Starting {} analysis for {}", kind.display_name(), content.url);

        let result = self.run(kind, content, keyword).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok((data, validation)) => {
                ::log::info!(
                    "{} analysis finished in {} ms (validation score {})",
                    kind.display_name(),
                    duration_ms,
                    validation.score
                );
                FrameworkOutcome {
                    framework: kind,
                    status: StepStatus::Succeeded,
                    data: Some(data),
                    error: None,
                    validation: Some(validation),
                    duration_ms,
                }
            }
            Err(e) => {
                ::log::warn!("{} analysis failed: {}", kind.display_name(), e);
                FrameworkOutcome {
                    framework: kind,
                    status: StepStatus::Failed,
                    data: None,
                    error: Some(e.to_string()),
                    validation: None,
                    duration_ms,
                }
            }
        }
    }

    async fn run(
        &self,
        kind: FrameworkKind,
        content: &ScrapedContent,
        keyword: Option<&str>,
    ) -> Result<(Value, ValidationReport)> {
        let prompt = framework_prompt(kind, content, keyword, self.max_chars);
        let mut data = self
            .llm
            .generate_json(&prompt.text, &prompt.schema_hint)
            .await?;

        // judged on the reply as sent, before any counts are filled in
        let validation = validate(kind, &data);
        if validation.score == 0 {
            return Err(AnalysisError::Parse(format!(
                "{} reply has none of the expected fields ({})",
                kind.display_name(),
                validation.missing_fields.join(", ")
            )));
        }

        let table = frameworks::taxonomy(kind);
        if matches!(kind, FrameworkKind::B2bElements | FrameworkKind::B2cElements) {
            let tally = ElementsTally::from_model(table, &data);
            if tally.reported_elements == 0 {
                return Err(AnalysisError::Parse(format!(
                    "{} reply names none of the {} known elements",
                    kind.display_name(),
                    tally.total_elements
                )));
            }
            tally.apply_to(&mut data);
        }

        if !validation.is_valid {
            ::log::warn!(
                "{} reply is missing fields: {}",
                kind.display_name(),
                validation.missing_fields.join(", ")
            );
        }

        if let Value::Object(map) = &mut data {
            let signals = keyword_signals(table, &content.clean_text);
            map.insert("keywordSignals".into(), serde_json::to_value(signals)?);
        }

        Ok((data, validation))
    }

    /// Analyses every requested framework concurrently. One failure never
    /// affects the others; outcomes come back in request order.
    pub async fn analyze_all(
        &self,
        kinds: &[FrameworkKind],
        content: &ScrapedContent,
        keyword: Option<&str>,
    ) -> Vec<FrameworkOutcome> {
        let mut unique: Vec<FrameworkKind> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !unique.contains(kind) {
                unique.push(*kind);
            }
        }

        let outcomes = join_all(
            unique
                .iter()
                .map(|kind| self.analyze(*kind, content, keyword)),
        )
        .await;

        let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
        ::log::info!(
            "Framework analysis complete: {} succeeded, {} failed",
            outcomes.len() - failed,
            failed
        );
        outcomes
    }
}
