use std::collections::HashMap;

/// Configuration options for cleaning extracted text
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    /// Keep paragraph structure (one blank line between paragraphs)
    pub preserve_paragraphs: bool,
    /// Collapse runs of whitespace into a single space
    pub normalize_whitespace: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            preserve_paragraphs: false,
            normalize_whitespace: true,
        }
    }
}

/// Cleans text with default options
pub fn clean(text: &str) -> String {
    clean_with_options(text, &TextOptions::default())
}

/// Cleans text with specific options
pub fn clean_with_options(text: &str, options: &TextOptions) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let paragraphs = split_into_paragraphs(text);
    let separator = if options.preserve_paragraphs {
        "\n\n"
    } else {
        " "
    };

    paragraphs
        .iter()
        .map(|para| {
            let joined = para.join(" ");
            if options.normalize_whitespace {
                normalize_segment(&joined)
            } else {
                joined
            }
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Splits text into paragraphs of trimmed lines, using blank lines as boundaries
pub fn split_into_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(trimmed);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Collapses whitespace within a single line or paragraph
pub fn normalize_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to at most `max_chars` characters without splitting a char
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "been", "before", "being", "below", "between",
    "both", "cannot", "could", "does", "doing", "down", "during", "each", "even", "every", "from",
    "further", "have", "having", "here", "into", "just", "like", "many", "more", "most", "much",
    "must", "only", "other", "ours", "over", "same", "should", "some", "such", "than", "that",
    "their", "theirs", "them", "then", "there", "these", "they", "this", "those", "through",
    "under", "until", "very", "want", "were", "what", "when", "where", "which", "while", "will",
    "with", "would", "your", "yours", "yourself",
];

/// Most frequent meaningful words, ties broken alphabetically
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for token in text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|t| t.trim_matches('\'').to_lowercase())
    {
        if token.chars().count() < 4
            || token.chars().all(|c| c.is_numeric())
            || STOPWORDS.contains(&token.as_str())
        {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(w, _)| w).collect()
}
