//! Aggregates every section of an analysis into one report.
//!
//! Building a report never fails. Everything in it is derived from the
//! inputs; sections that are missing are listed in `dataQuality` instead of
//! being filled with stand-in values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::results::{
    ActionItem, Availability, FrameworkKind, FrameworkOutcome, LighthouseScores, Level,
    NOT_REQUESTED, PageAudit, Recommendation, ScrapedContent, StepStatus, TrendsSnapshot,
};

const STRONG_DIMENSION: f64 = 70.0;
const WEAK_DIMENSION: f64 = 50.0;
const EXCELLENT_CATEGORY: u8 = 90;
const POOR_CATEGORY: u8 = 50;
const STRONG_ELEMENT: f64 = 7.0;
const MAX_ELEMENT_STRENGTHS: usize = 3;
const LOW_COVERAGE: f64 = 25.0;
const THIN_CONTENT_WORDS: usize = 300;

/// Everything the report is built from
#[derive(Debug, Clone, Copy)]
pub struct ComprehensiveInputs<'a> {
    pub url: &'a str,
    pub content: &'a ScrapedContent,
    pub frameworks: &'a [FrameworkOutcome],
    pub lighthouse: &'a Availability<LighthouseScores>,
    pub trends: &'a Availability<TrendsSnapshot>,
    pub pages: &'a [PageAudit],
    pub insights: &'a Availability<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScore {
    pub component: String,
    pub score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoSummary {
    pub has_title: bool,
    pub title_length: usize,
    pub has_meta_description: bool,
    pub meta_description_length: usize,
    pub heading_count: usize,
    pub word_count: usize,
    pub lighthouse_seo: Option<u8>,
    pub issues: Vec<String>,
}

/// Whether a section of the report is backed by data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStatus {
    pub section: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveReport {
    /// Mean of the available component scores; absent when none are
    pub overall_score: Option<u8>,
    pub executive_summary: String,
    pub component_scores: Vec<ComponentScore>,
    pub key_strengths: Vec<String>,
    pub key_weaknesses: Vec<String>,
    pub seo_summary: SeoSummary,
    pub recommendations: Vec<Recommendation>,
    pub action_items: Vec<ActionItem>,
    pub data_quality: Vec<SectionStatus>,
}

/// A deterministic finding that also becomes a recommendation
struct Finding {
    issue: String,
    fix: String,
    priority: Level,
    source: &'static str,
}

pub struct ReportBuilder;

impl ReportBuilder {
    pub fn build(inputs: &ComprehensiveInputs<'_>) -> ComprehensiveReport {
        let component_scores = component_scores(inputs);
        let overall_score = overall_score(&component_scores);
        let findings = content_findings(inputs.content, inputs.lighthouse);
        let seo_summary = seo_summary(inputs.content, inputs.lighthouse, &findings);
        let key_strengths = key_strengths(inputs);
        let key_weaknesses = key_weaknesses(inputs, &findings);
        let recommendations = recommendations(inputs, &findings);
        let action_items = action_items(&recommendations);
        let data_quality = data_quality(inputs);
        let executive_summary = executive_summary(
            inputs,
            overall_score,
            &key_strengths,
            &key_weaknesses,
        );

        ::log::debug!(
            "Built report for {}: score {:?}, {} recommendations",
            inputs.url,
            overall_score,
            recommendations.len()
        );

        ComprehensiveReport {
            overall_score,
            executive_summary,
            component_scores,
            key_strengths,
            key_weaknesses,
            seo_summary,
            recommendations,
            action_items,
            data_quality,
        }
    }
}

/// Reads a numeric score that the model may have sent as a string
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn framework_score(outcome: &FrameworkOutcome) -> Option<f64> {
    let data = outcome.data.as_ref()?;
    number(data.get("overallScore")).map(|s| s.clamp(0.0, 100.0))
}

fn component_scores(inputs: &ComprehensiveInputs<'_>) -> Vec<ComponentScore> {
    let mut scores: Vec<ComponentScore> = inputs
        .frameworks
        .iter()
        .map(|outcome| ComponentScore {
            component: outcome.framework.display_name().to_string(),
            score: framework_score(outcome).map(|s| s.round() as u8),
        })
        .collect();
    scores.push(ComponentScore {
        component: "Lighthouse".to_string(),
        score: inputs.lighthouse.value().map(|l| l.mean().round() as u8),
    });
    scores
}

fn overall_score(components: &[ComponentScore]) -> Option<u8> {
    let available: Vec<f64> = components
        .iter()
        .filter_map(|c| c.score.map(f64::from))
        .collect();
    if available.is_empty() {
        return None;
    }
    Some((available.iter().sum::<f64>() / available.len() as f64).round() as u8)
}

fn find_data<'a>(frameworks: &'a [FrameworkOutcome], kind: FrameworkKind) -> Option<&'a Value> {
    frameworks
        .iter()
        .find(|o| o.framework == kind && o.succeeded())
        .and_then(|o| o.data.as_ref())
}

const DIMENSIONS: [&str; 4] = ["why", "how", "what", "who"];

fn dimension_scores(frameworks: &[FrameworkOutcome]) -> Vec<(&'static str, f64, Option<String>)> {
    let Some(data) = find_data(frameworks, FrameworkKind::GoldenCircle) else {
        return Vec::new();
    };
    DIMENSIONS
        .iter()
        .filter_map(|dim| {
            let entry = data.get(*dim)?;
            let score = number(entry.get("score"))?;
            let statement = entry
                .get("statement")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            Some((*dim, score, statement))
        })
        .collect()
}

fn strong_elements(frameworks: &[FrameworkOutcome]) -> Vec<String> {
    let mut present: Vec<(f64, String)> = Vec::new();
    for kind in [FrameworkKind::B2bElements, FrameworkKind::B2cElements] {
        let Some(elements) = find_data(frameworks, kind)
            .and_then(|d| d.get("elements"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        for element in elements {
            let is_present = element.get("present").and_then(Value::as_bool) == Some(true);
            let score = number(element.get("score")).unwrap_or(0.0);
            if is_present && score >= STRONG_ELEMENT {
                if let Some(name) = element.get("name").and_then(Value::as_str) {
                    present.push((
                        score,
                        format!("Delivers '{}' ({})", name, kind.display_name()),
                    ));
                }
            }
        }
    }
    present.sort_by(|a, b| b.0.total_cmp(&a.0));
    present
        .into_iter()
        .take(MAX_ELEMENT_STRENGTHS)
        .map(|(_, text)| text)
        .collect()
}

fn key_strengths(inputs: &ComprehensiveInputs<'_>) -> Vec<String> {
    let mut strengths = Vec::new();

    for (dim, score, statement) in dimension_scores(inputs.frameworks) {
        if score >= STRONG_DIMENSION {
            strengths.push(match statement {
                Some(statement) => format!(
                    "Clear {} ({:.0}/100): {}",
                    dim.to_uppercase(),
                    score,
                    statement
                ),
                None => format!("Clear {} ({:.0}/100)", dim.to_uppercase(), score),
            });
        }
    }

    strengths.extend(strong_elements(inputs.frameworks));

    if let Some(scores) = inputs.lighthouse.value() {
        if let Some((name, score)) = scores
            .categories()
            .into_iter()
            .filter(|(_, score)| *score >= EXCELLENT_CATEGORY)
            .max_by_key(|(_, score)| *score)
        {
            strengths.push(format!("Excellent {} score ({}/100)", name, score));
        }
    }

    strengths
}

fn key_weaknesses(inputs: &ComprehensiveInputs<'_>, findings: &[Finding]) -> Vec<String> {
    let mut weaknesses = Vec::new();

    for (dim, score, _) in dimension_scores(inputs.frameworks) {
        if score < WEAK_DIMENSION {
            weaknesses.push(format!(
                "Weak {} messaging ({:.0}/100)",
                dim.to_uppercase(),
                score
            ));
        }
    }

    for kind in [FrameworkKind::B2bElements, FrameworkKind::B2cElements] {
        let Some(data) = find_data(inputs.frameworks, kind) else {
            continue;
        };
        let present = number(data.get("presentElements"));
        let total = number(data.get("totalElements"));
        if let (Some(present), Some(total)) = (present, total) {
            if total > 0.0 && present * 100.0 / total < LOW_COVERAGE {
                weaknesses.push(format!(
                    "Communicates only {:.0} of {:.0} {}",
                    present,
                    total,
                    kind.display_name()
                ));
            }
        }
    }

    if let Some(scores) = inputs.lighthouse.value() {
        for (name, score) in scores.categories() {
            if score < POOR_CATEGORY {
                weaknesses.push(format!("Poor {} score ({}/100)", name, score));
            }
        }
    }

    weaknesses.extend(
        findings
            .iter()
            .filter(|f| f.priority == Level::High)
            .map(|f| f.issue.clone()),
    );
    weaknesses
}

fn content_findings(
    content: &ScrapedContent,
    lighthouse: &Availability<LighthouseScores>,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    match content.title.as_deref().map(str::trim) {
        None | Some("") => findings.push(Finding {
            issue: "Page has no title".to_string(),
            fix: "Add a descriptive <title> of 10-60 characters".to_string(),
            priority: Level::High,
            source: "seo",
        }),
        Some(title) => {
            let len = title.chars().count();
            if !(10..=60).contains(&len) {
                findings.push(Finding {
                    issue: format!("Title is {} characters long", len),
                    fix: "Keep the title between 10 and 60 characters".to_string(),
                    priority: Level::Medium,
                    source: "seo",
                });
            }
        }
    }

    match content.meta_description.as_deref().map(str::trim) {
        None | Some("") => findings.push(Finding {
            issue: "Page has no meta description".to_string(),
            fix: "Write a meta description of 50-160 characters".to_string(),
            priority: Level::High,
            source: "seo",
        }),
        Some(meta) => {
            let len = meta.chars().count();
            if !(50..=160).contains(&len) {
                findings.push(Finding {
                    issue: format!("Meta description is {} characters long", len),
                    fix: "Keep the meta description between 50 and 160 characters".to_string(),
                    priority: Level::Low,
                    source: "seo",
                });
            }
        }
    }

    if content.headings.is_empty() {
        findings.push(Finding {
            issue: "No h1-h3 headings found".to_string(),
            fix: "Structure the page with a single h1 and descriptive h2/h3 headings".to_string(),
            priority: Level::Medium,
            source: "seo",
        });
    }

    if content.word_count < THIN_CONTENT_WORDS {
        findings.push(Finding {
            issue: format!("Thin content ({} words)", content.word_count),
            fix: format!(
                "Expand the page copy to at least {} words",
                THIN_CONTENT_WORDS
            ),
            priority: Level::Medium,
            source: "content",
        });
    }

    if let Some(scores) = lighthouse.value() {
        if scores.seo < 80 {
            findings.push(Finding {
                issue: format!("Lighthouse SEO score is {}", scores.seo),
                fix: "Resolve the failed Lighthouse SEO audits".to_string(),
                priority: Level::Medium,
                source: "seo",
            });
        }
        if scores.performance < POOR_CATEGORY {
            findings.push(Finding {
                issue: format!("Lighthouse performance score is {}", scores.performance),
                fix: "Reduce page weight and render-blocking resources".to_string(),
                priority: Level::High,
                source: "performance",
            });
        }
    }

    findings
}

fn seo_summary(
    content: &ScrapedContent,
    lighthouse: &Availability<LighthouseScores>,
    findings: &[Finding],
) -> SeoSummary {
    let title = content.title.as_deref().map(str::trim).unwrap_or("");
    let meta = content
        .meta_description
        .as_deref()
        .map(str::trim)
        .unwrap_or("");
    SeoSummary {
        has_title: !title.is_empty(),
        title_length: title.chars().count(),
        has_meta_description: !meta.is_empty(),
        meta_description_length: meta.chars().count(),
        heading_count: content.headings.len(),
        word_count: content.word_count,
        lighthouse_seo: lighthouse.value().map(|l| l.seo),
        issues: findings
            .iter()
            .filter(|f| f.source == "seo")
            .map(|f| f.issue.clone())
            .collect(),
    }
}

fn level(value: Option<&Value>) -> Level {
    value
        .and_then(Value::as_str)
        .and_then(Level::parse_loose)
        .unwrap_or(Level::Medium)
}

fn model_recommendations(data: &Value, source: &str) -> Vec<Recommendation> {
    let Some(items) = data.get("recommendations").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let (title, description) = match item {
                Value::String(text) => (text.trim().to_string(), String::new()),
                Value::Object(_) => (
                    item.get("title")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .unwrap_or("")
                        .to_string(),
                    item.get("description")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .trim()
                        .to_string(),
                ),
                _ => return None,
            };
            if title.is_empty() {
                return None;
            }
            Some(Recommendation {
                id: String::new(),
                title,
                description,
                priority: level(item.get("priority")),
                effort: level(item.get("effort")),
                impact: level(item.get("impact")),
                source: source.to_string(),
            })
        })
        .collect()
}

fn recommendations(inputs: &ComprehensiveInputs<'_>, findings: &[Finding]) -> Vec<Recommendation> {
    let mut all: Vec<Recommendation> = findings
        .iter()
        .map(|f| Recommendation {
            id: String::new(),
            title: f.fix.clone(),
            description: f.issue.clone(),
            priority: f.priority,
            effort: Level::Low,
            impact: f.priority,
            source: f.source.to_string(),
        })
        .collect();

    for outcome in inputs.frameworks.iter().filter(|o| o.succeeded()) {
        if let Some(data) = &outcome.data {
            all.extend(model_recommendations(data, outcome.framework.as_str()));
        }
    }
    if let Some(insights) = inputs.insights.value() {
        all.extend(model_recommendations(insights, "insights"));
    }

    let mut seen = HashSet::new();
    all.retain(|r| seen.insert(r.title.to_lowercase()));

    // Stable: ties keep their source order
    all.sort_by_key(|r| (r.priority, r.impact));
    for (i, rec) in all.iter_mut().enumerate() {
        rec.id = format!("rec-{:03}", i + 1);
    }
    all
}

/// Target window for acting on a recommendation of the given priority
pub fn timeframe_for(priority: Level) -> &'static str {
    match priority {
        Level::High => "0-30 days",
        Level::Medium => "30-60 days",
        Level::Low => "60-90 days",
    }
}

fn action_items(recommendations: &[Recommendation]) -> Vec<ActionItem> {
    recommendations
        .iter()
        .filter(|r| r.priority != Level::Low)
        .enumerate()
        .map(|(i, r)| ActionItem {
            id: format!("action-{:03}", i + 1),
            title: r.title.clone(),
            priority: r.priority,
            effort: r.effort,
            impact: r.impact,
            timeframe: timeframe_for(r.priority).to_string(),
        })
        .collect()
}

fn availability_status<T>(section: &str, value: &Availability<T>) -> SectionStatus {
    match value {
        Availability::Available { .. } => SectionStatus {
            section: section.to_string(),
            status: StepStatus::Succeeded,
            detail: None,
        },
        Availability::Unavailable { reason } => SectionStatus {
            section: section.to_string(),
            status: if reason == NOT_REQUESTED {
                StepStatus::Skipped
            } else {
                StepStatus::Failed
            },
            detail: Some(reason.clone()),
        },
    }
}

fn data_quality(inputs: &ComprehensiveInputs<'_>) -> Vec<SectionStatus> {
    let mut sections = vec![SectionStatus {
        section: "content".to_string(),
        status: StepStatus::Succeeded,
        detail: None,
    }];

    sections.extend(inputs.frameworks.iter().map(|o| SectionStatus {
        section: o.framework.as_str().to_string(),
        status: o.status,
        detail: o.error.clone(),
    }));

    sections.push(availability_status("lighthouse", inputs.lighthouse));
    sections.push(availability_status("trends", inputs.trends));
    sections.push(availability_status("insights", inputs.insights));

    if !inputs.pages.is_empty() {
        let failed = inputs
            .pages
            .iter()
            .filter(|p| !p.summary.is_available())
            .count();
        sections.push(SectionStatus {
            section: "pages".to_string(),
            status: if failed == 0 {
                StepStatus::Succeeded
            } else {
                StepStatus::Failed
            },
            detail: (failed > 0)
                .then(|| format!("{} of {} pages could not be fetched", failed, inputs.pages.len())),
        });
    }

    sections
}

fn executive_summary(
    inputs: &ComprehensiveInputs<'_>,
    overall: Option<u8>,
    strengths: &[String],
    weaknesses: &[String],
) -> String {
    let site = inputs
        .content
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("{} ({})", t, inputs.url))
        .unwrap_or_else(|| inputs.url.to_string());

    let mut parts = vec![match overall {
        Some(score) => format!("Analysis of {} scored {}/100 overall.", site, score),
        None => format!(
            "Analysis of {}: no overall score could be computed because no scored section was available.",
            site
        ),
    }];

    if !inputs.frameworks.is_empty() {
        let failed: Vec<&str> = inputs
            .frameworks
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.framework.display_name())
            .collect();
        let succeeded = inputs.frameworks.len() - failed.len();
        let mut line = format!(
            "{} of {} framework analyses succeeded",
            succeeded,
            inputs.frameworks.len()
        );
        if !failed.is_empty() {
            line.push_str(&format!(" (failed: {})", failed.join(", ")));
        }
        line.push('.');
        parts.push(line);
    }

    if let Some(strength) = strengths.first() {
        parts.push(format!("Top strength: {}.", strength));
    }
    if let Some(weakness) = weaknesses.first() {
        parts.push(format!("Main weakness: {}.", weakness));
    }
    if let Some(summary) = inputs
        .insights
        .value()
        .and_then(|v| v.get("strategicSummary"))
        .and_then(Value::as_str)
    {
        parts.push(summary.trim().to_string());
    }

    parts.join(" ")
}
