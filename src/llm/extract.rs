use serde_json::Value;

use crate::error::{AnalysisError, Result};
use crate::parsers::text::truncate_chars;

/// Openings that mean the model reported a problem instead of answering
const REFUSAL_PREFIXES: &[&str] = &[
    "error",
    "failed",
    "i cannot",
    "i can't",
    "i am unable",
    "i'm unable",
    "i'm sorry",
    "sorry",
];

const SNIPPET_CHARS: usize = 200;

/// Extracts the JSON object embedded in a model's free-text reply.
///
/// Code fences are stripped, then everything from the first `{` to the last
/// `}` is parsed. The shape of the object is not checked here.
pub fn extract_json(raw: &str) -> Result<Value> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(AnalysisError::Parse("model returned an empty response".to_string()));
    }

    if is_refusal(text) {
        return Err(AnalysisError::ModelRefused(snippet(text)));
    }

    let start = text.find('{').ok_or_else(|| {
        AnalysisError::Parse(format!("no JSON object found in response: {}", snippet(text)))
    })?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| {
            AnalysisError::Parse(format!("unterminated JSON object in response: {}", snippet(text)))
        })?;

    let candidate = &text[start..=end];
    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        ::log::debug!("JSON parse failed: {}. Candidate: {}", e, snippet(candidate));
        AnalysisError::Parse(format!("invalid JSON in response: {}", e))
    })?;

    if !value.is_object() {
        return Err(AnalysisError::Parse("response JSON is not an object".to_string()));
    }

    Ok(value)
}

/// Removes a leading ```json / ``` fence line and a trailing ``` fence
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(newline) => &text[newline + 1..],
            None => text.trim_start_matches('`').trim_start_matches("json"),
        };
    }

    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }

    text.trim()
}

/// A refusal opens with one of the prefixes as whole words and carries no object
fn is_refusal(text: &str) -> bool {
    let head: String = text.chars().take(32).collect::<String>().to_lowercase();
    let opens_with_refusal = REFUSAL_PREFIXES.iter().any(|prefix| {
        head.strip_prefix(prefix)
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
    });
    opens_with_refusal && !has_object(text)
}

fn has_object(text: &str) -> bool {
    text.find('{')
        .zip(text.rfind('}'))
        .is_some_and(|(start, end)| end > start)
}

fn snippet(text: &str) -> String {
    truncate_chars(text, SNIPPET_CHARS).to_string()
}
