pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use crate::results::ScrapedContent;

/// Extracts content from a fetched HTML body and applies the text budget
pub fn extract_page(html: &str, url: &str, max_chars: usize) -> ScrapedContent {
    let mut content = html::extract(html, url);
    let truncated = text::truncate_chars(&content.clean_text, max_chars);
    if truncated.len() < content.clean_text.len() {
        ::log::debug!(
            "Truncating text of {} to {} characters",
            url,
            max_chars
        );
        content.clean_text = truncated.to_string();
    }
    content
}
