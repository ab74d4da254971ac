//! Prompt construction in Persona / Task / Context / Format order.

use serde_json::Value;

use crate::frameworks::{self, Taxonomy, keyword_signals};
use crate::parsers::text::truncate_chars;
use crate::results::{FrameworkKind, FrameworkOutcome, ScrapedContent};

/// A prompt together with the JSON shape the reply must follow
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub schema_hint: String,
}

/// Builds one prompt string with labelled sections
#[derive(Debug, Default)]
pub struct PromptBuilder {
    persona: String,
    task: String,
    context: Vec<String>,
    reference: Option<String>,
    format: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    /// Adds a free-form context block
    pub fn context(mut self, block: impl Into<String>) -> Self {
        self.context.push(block.into());
        self
    }

    /// Adds the page content, with the text cut to `max_chars`
    pub fn content(self, content: &ScrapedContent, max_chars: usize) -> Self {
        let mut block = format!("Website URL: {}\n", content.url);
        if let Some(title) = &content.title {
            block.push_str(&format!("Title: {}\n", title));
        }
        if let Some(meta) = &content.meta_description {
            block.push_str(&format!("Meta description: {}\n", meta));
        }
        if !content.headings.is_empty() {
            block.push_str(&format!("Headings: {}\n", content.headings.join(" | ")));
        }
        if !content.extracted_keywords.is_empty() {
            block.push_str(&format!(
                "Frequent terms: {}\n",
                content.extracted_keywords.join(", ")
            ));
        }
        block.push_str(&format!(
            "Word count: {}, images: {}, links: {}\n\nPage text:\n{}",
            content.word_count,
            content.image_count,
            content.link_count,
            truncate_chars(&content.clean_text, max_chars)
        ));
        self.context(block)
    }

    pub fn reference(mut self, table: &Taxonomy) -> Self {
        self.reference = Some(table.reference_table());
        self
    }

    pub fn format(mut self, schema: impl Into<String>) -> Self {
        self.format = schema.into();
        self
    }

    pub fn build(self) -> Prompt {
        let mut text = String::new();
        text.push_str("PERSONA:\n");
        text.push_str(&self.persona);
        text.push_str("\n\nTASK:\n");
        text.push_str(&self.task);
        text.push_str("\n\nCONTEXT:\n");
        text.push_str(&self.context.join("\n\n"));
        if let Some(reference) = &self.reference {
            text.push_str("\n\nREFERENCE:\n");
            text.push_str(reference);
        }
        text.push_str("\n\nFORMAT:\nRespond with ONLY a valid JSON object, no markdown fences and no commentary, matching this structure:\n");
        text.push_str(&self.format);

        Prompt {
            text,
            schema_hint: self.format,
        }
    }
}

const GOLDEN_CIRCLE_SCHEMA: &str = r#"{
  "why": {"statement": "string", "score": 0, "evidence": ["string"]},
  "how": {"statement": "string", "score": 0, "evidence": ["string"]},
  "what": {"statement": "string", "score": 0, "evidence": ["string"]},
  "who": {"statement": "string", "score": 0, "evidence": ["string"]},
  "overallScore": 0,
  "summary": "string",
  "recommendations": [{"title": "string", "description": "string", "priority": "High|Medium|Low", "effort": "High|Medium|Low", "impact": "High|Medium|Low"}]
}"#;

const ELEMENTS_SCHEMA: &str = r#"{
  "elements": [{"name": "element name exactly as listed", "present": true, "score": 0, "evidence": "string"}],
  "overallScore": 0,
  "summary": "string",
  "recommendations": [{"title": "string", "description": "string", "priority": "High|Medium|Low", "effort": "High|Medium|Low", "impact": "High|Medium|Low"}]
}"#;

const CLIFTON_SCHEMA: &str = r#"{
  "topThemes": [{"name": "theme name exactly as listed", "domain": "string", "score": 0, "evidence": "string"}],
  "domainScores": {"Executing": 0, "Influencing": 0, "Relationship Building": 0, "Strategic Thinking": 0},
  "overallScore": 0,
  "summary": "string",
  "recommendations": [{"title": "string", "description": "string", "priority": "High|Medium|Low", "effort": "High|Medium|Low", "impact": "High|Medium|Low"}]
}"#;

const REVENUE_SCHEMA: &str = r#"{
  "revenueModel": "string",
  "signals": [{"name": "signal name exactly as listed", "present": true, "evidence": "string"}],
  "growthOpportunities": ["string"],
  "overallScore": 0,
  "summary": "string",
  "recommendations": [{"title": "string", "description": "string", "priority": "High|Medium|Low", "effort": "High|Medium|Low", "impact": "High|Medium|Low"}]
}"#;

const INSIGHTS_SCHEMA: &str = r#"{
  "strategicSummary": "string",
  "keyInsights": ["string"],
  "opportunities": ["string"],
  "risks": ["string"],
  "recommendations": [{"title": "string", "description": "string", "priority": "High|Medium|Low", "effort": "High|Medium|Low", "impact": "High|Medium|Low"}]
}"#;

/// JSON structure the model is asked to return for a framework
pub fn schema_for(kind: FrameworkKind) -> &'static str {
    match kind {
        FrameworkKind::GoldenCircle => GOLDEN_CIRCLE_SCHEMA,
        FrameworkKind::B2cElements | FrameworkKind::B2bElements => ELEMENTS_SCHEMA,
        FrameworkKind::CliftonStrengths => CLIFTON_SCHEMA,
        FrameworkKind::RevenueTrends => REVENUE_SCHEMA,
    }
}

fn task_for(kind: FrameworkKind) -> String {
    match kind {
        FrameworkKind::GoldenCircle => "Analyse the website using Simon Sinek's Golden Circle. \
            Identify the WHY (purpose), HOW (differentiating approach), WHAT (offering) and \
            WHO (target audience) as communicated on the page. Score each dimension 0-100 for \
            clarity and strength, and give an overall score 0-100."
            .to_string(),
        FrameworkKind::B2cElements | FrameworkKind::B2bElements => format!(
            "Assess which of the {} listed in the reference table the website delivers. \
            Report every element by its exact name with present true/false, a 0-10 score \
            and a short evidence quote. Give an overall score 0-100.",
            match kind {
                FrameworkKind::B2bElements => "42 B2B Elements of Value",
                _ => "30 B2C Elements of Value",
            }
        ),
        FrameworkKind::CliftonStrengths => "Infer which CliftonStrengths themes the brand \
            voice expresses. List the strongest themes with their domain, a 0-100 score and \
            evidence, score each of the four domains 0-100, and give an overall score 0-100."
            .to_string(),
        FrameworkKind::RevenueTrends => "Identify the revenue model and the growth and \
            market signals visible on the website. Report each listed signal by its exact \
            name with present true/false and evidence, list growth opportunities, and give \
            an overall revenue-readiness score 0-100."
            .to_string(),
    }
}

/// Builds the analysis prompt for any framework
pub fn framework_prompt(
    kind: FrameworkKind,
    content: &ScrapedContent,
    keyword: Option<&str>,
    max_chars: usize,
) -> Prompt {
    let table = frameworks::taxonomy(kind);
    let mut builder = PromptBuilder::new()
        .persona(format!(
            "You are a senior brand strategist and conversion consultant who applies the {} \
            framework to marketing websites. You judge only from the evidence on the page.",
            kind.display_name()
        ))
        .task(task_for(kind))
        .content(content, max_chars);

    if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
        builder = builder.context(format!("Target keyword: {}", keyword));
    }

    let signals = keyword_signals(table, &content.clean_text);
    if !signals.is_empty() {
        let lines: Vec<String> = signals
            .iter()
            .map(|s| format!("- {} ({}): {}", s.element, s.category, s.matched.join(", ")))
            .collect();
        builder = builder.context(format!(
            "Keyword hints (phrases found in the page text, not proof):\n{}",
            lines.join("\n")
        ));
    }

    builder
        .reference(table)
        .format(schema_for(kind))
        .build()
}

/// Builds the strategic synthesis prompt from the framework results
pub fn insights_prompt(content: &ScrapedContent, outcomes: &[FrameworkOutcome]) -> Prompt {
    let mut builder = PromptBuilder::new()
        .persona(
            "You are a chief marketing strategist synthesising several framework analyses \
            of one website into a coherent strategy.",
        )
        .task(
            "Combine the framework results below into strategic insights: the overall \
            positioning, the most important opportunities and risks, and prioritised \
            recommendations. Do not repeat the inputs verbatim.",
        )
        .content(content, 2000);

    for outcome in outcomes {
        let block = match (&outcome.data, &outcome.error) {
            (Some(data), _) => format!(
                "{} result:\n{}",
                outcome.framework.display_name(),
                compact(data)
            ),
            (None, Some(error)) => format!(
                "{} analysis failed: {}",
                outcome.framework.display_name(),
                error
            ),
            (None, None) => continue,
        };
        builder = builder.context(block);
    }

    builder.format(INSIGHTS_SCHEMA).build()
}

/// JSON without the bulky per-element listings
fn compact(data: &Value) -> String {
    let mut data = data.clone();
    if let Value::Object(map) = &mut data {
        map.remove("elements");
        map.remove("categoryTallies");
    }
    let text = serde_json::to_string(&data).unwrap_or_default();
    truncate_chars(&text, 3000).to_string()
}
