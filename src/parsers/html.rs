use crate::parsers::text;
use crate::results::ScrapedContent;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Elements whose text is never visible to a reader
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "svg", "template", "head"];

const KEYWORD_LIMIT: usize = 10;

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css}: {e}"))
}

static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3"));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[name="description"], meta[name="Description"]"#));
static OG_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[property="og:description"]"#));
static IMAGES: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

/// Extracts structured content from an HTML document.
///
/// `clean_text` is not truncated here; callers apply their own budget.
pub fn extract(html: &str, url: &str) -> ScrapedContent {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, &TITLE).or_else(|| first_text(&doc, &H1));
    let meta_description = meta_content(&doc, &META_DESCRIPTION)
        .or_else(|| meta_content(&doc, &OG_DESCRIPTION));

    let headings = doc
        .select(&HEADINGS)
        .map(element_text)
        .filter(|h| !h.is_empty())
        .collect::<Vec<_>>();

    let clean_text = doc
        .select(&BODY)
        .next()
        .map(visible_text)
        .unwrap_or_default();

    let links = doc
        .select(&LINKS)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    let image_count = doc.select(&IMAGES).count();

    ::log::debug!(
        "Extracted {} headings, {} links, {} images from {}",
        headings.len(),
        links.len(),
        image_count,
        url
    );

    ScrapedContent {
        url: url.to_string(),
        title,
        meta_description,
        word_count: text::word_count(&clean_text),
        extracted_keywords: text::extract_keywords(&clean_text, KEYWORD_LIMIT),
        clean_text,
        headings,
        image_count,
        link_count: links.len(),
        links,
    }
}

/// Joins the text of visible descendants line by line, skipping hidden elements
fn visible_text(root: ElementRef) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in root.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
        });
        if !hidden {
            parts.push(&**fragment);
        }
    }

    text::clean(&parts.join("\n"))
}

fn element_text(element: ElementRef) -> String {
    text::normalize_segment(&element.text().collect::<Vec<_>>().join(" "))
}

fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn meta_content(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .filter_map(|e| e.value().attr("content"))
        .map(text::normalize_segment)
        .find(|c| !c.is_empty())
}
