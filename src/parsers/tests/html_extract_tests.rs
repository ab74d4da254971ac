use crate::parsers::{extract_page, html};

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>  Acme Analytics | Grow Faster </title>
  <meta name="description" content="Analytics that help   small teams grow.">
  <style>.hero { color: red; }</style>
  <script>window.tracking = "should not appear";</script>
</head>
<body>
  <header><h1>Grow faster with Acme</h1></header>
  <main>
    <h2>Why teams choose us</h2>
    <p>Acme analytics reduces cost and saves time for growing teams.</p>
    <p>Analytics dashboards, analytics alerts, and integration with your stack.</p>
    <img src="/hero.png"><img src="/logo.svg">
    <noscript>Enable JavaScript</noscript>
    <h3>Pricing</h3>
    <a href="/pricing">Pricing</a>
    <a href="https://twitter.com/acme">Twitter</a>
    <a href="">Empty</a>
  </main>
  <script>console.log("hidden")</script>
</body>
</html>"#;

#[test]
fn test_extracts_title_meta_and_headings() {
    let content = html::extract(LANDING_PAGE, "https://acme.test/");
    assert_eq!(content.url, "https://acme.test/");
    assert_eq!(content.title.as_deref(), Some("Acme Analytics | Grow Faster"));
    assert_eq!(
        content.meta_description.as_deref(),
        Some("Analytics that help small teams grow.")
    );
    assert_eq!(
        content.headings,
        vec!["Grow faster with Acme", "Why teams choose us", "Pricing"]
    );
}

#[test]
fn test_clean_text_skips_scripts_styles_and_noscript() {
    let content = html::extract(LANDING_PAGE, "https://acme.test/");
    assert!(content.clean_text.contains("Acme analytics reduces cost"));
    assert!(!content.clean_text.contains("tracking"));
    assert!(!content.clean_text.contains("console.log"));
    assert!(!content.clean_text.contains("Enable JavaScript"));
    assert!(!content.clean_text.contains("color: red"));
    assert!(!content.clean_text.contains("  "));
}

#[test]
fn test_counts_and_links() {
    let content = html::extract(LANDING_PAGE, "https://acme.test/");
    assert_eq!(content.image_count, 2);
    assert_eq!(content.link_count, 2);
    assert_eq!(content.links, vec!["/pricing", "https://twitter.com/acme"]);
    assert_eq!(content.word_count, content.clean_text.split_whitespace().count());
}

#[test]
fn test_multiline_body_text_is_flattened() {
    let page = "<html><body><p>Line one\n\n      line   two</p>\n\t<div>\r\n  Tail\t text  </div></body></html>";
    let content = html::extract(page, "https://x.test/");
    assert_eq!(content.clean_text, "Line one line two Tail text");
    assert_eq!(content.word_count, 6);
}

#[test]
fn test_keywords_rank_by_frequency() {
    let content = html::extract(LANDING_PAGE, "https://acme.test/");
    assert_eq!(content.extracted_keywords.first().map(String::as_str), Some("analytics"));
    assert!(content.extracted_keywords.len() <= 10);
    assert!(!content.extracted_keywords.contains(&"with".to_string()));
}

#[test]
fn test_title_falls_back_to_h1_and_og_description() {
    let page = r#"<html><head><meta property="og:description" content="OG text"></head>
        <body><h1>Only Heading</h1></body></html>"#;
    let content = html::extract(page, "https://x.test/");
    assert_eq!(content.title.as_deref(), Some("Only Heading"));
    assert_eq!(content.meta_description.as_deref(), Some("OG text"));
}

#[test]
fn test_empty_document() {
    let content = html::extract("", "https://x.test/");
    assert_eq!(content.title, None);
    assert_eq!(content.clean_text, "");
    assert_eq!(content.word_count, 0);
    assert!(content.headings.is_empty());
}

#[test]
fn test_extract_page_applies_char_budget() {
    let body = "é".repeat(50);
    let page = format!("<html><body><p>{}</p></body></html>", body);
    let content = extract_page(&page, "https://x.test/", 10);
    assert_eq!(content.clean_text.chars().count(), 10);

    let content = extract_page(&page, "https://x.test/", 8000);
    assert_eq!(content.clean_text.chars().count(), 50);
}
