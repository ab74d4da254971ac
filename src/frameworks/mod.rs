//! Static reference tables for the business frameworks.
//!
//! Each table is a JSON file compiled into the binary. The tables only
//! describe the frameworks; judging a site against them is left to the model,
//! with [`keyword_signals`] as a deterministic hint.

pub mod elements;

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::results::FrameworkKind;

/// A framework's reference table: categories, optional subcategories, elements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    pub name: String,
    pub description: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcategory {
    pub name: String,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    /// Lower-case phrases whose presence hints at the element
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// An element together with where it sits in the taxonomy
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    pub category: &'a str,
    pub subcategory: Option<&'a str>,
    pub element: &'a Element,
}

impl Category {
    /// Elements of this category, including those in subcategories
    pub fn all_elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        let direct = self.elements.iter().map(move |element| ElementRef {
            category: &self.name,
            subcategory: None,
            element,
        });
        let nested = self.subcategories.iter().flat_map(move |sub| {
            sub.elements.iter().map(move |element| ElementRef {
                category: &self.name,
                subcategory: Some(sub.name.as_str()),
                element,
            })
        });
        direct.chain(nested)
    }

    pub fn total(&self) -> usize {
        self.all_elements().count()
    }
}

impl Taxonomy {
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.categories.iter().flat_map(Category::all_elements)
    }

    pub fn total(&self) -> usize {
        self.elements().count()
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn subcategory_total(&self, category: &str, subcategory: &str) -> Option<usize> {
        self.category(category)?
            .subcategories
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(subcategory))
            .map(|s| s.elements.len())
    }

    /// Looks an element up by name, ignoring case and punctuation
    pub fn find(&self, name: &str) -> Option<ElementRef<'_>> {
        let wanted = name_key(name);
        self.elements().find(|e| name_key(&e.element.name) == wanted)
    }

    /// Human-readable table embedded in prompts
    pub fn reference_table(&self) -> String {
        let mut out = format!("{}\n{}\n", self.name, self.description);
        for category in &self.categories {
            out.push_str(&format!("\n## {} ({} elements)", category.name, category.total()));
            if !category.description.is_empty() {
                out.push_str(&format!(": {}", category.description));
            }
            out.push('\n');
            for entry in category.all_elements() {
                let prefix = entry
                    .subcategory
                    .map(|s| format!("[{}] ", s))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "- {}{} (signals: {})\n",
                    prefix,
                    entry.element.name,
                    entry.element.keywords.join(", ")
                ));
            }
        }
        out
    }
}

/// Normalised lookup key for element names
pub fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn load(source: &str, file: &str) -> Taxonomy {
    serde_json::from_str(source)
        .unwrap_or_else(|e| panic!("framework table {} is malformed: {}", file, e))
}

static GOLDEN_CIRCLE: LazyLock<Taxonomy> =
    LazyLock::new(|| load(include_str!("data/golden_circle.json"), "golden_circle.json"));
static B2C_ELEMENTS: LazyLock<Taxonomy> =
    LazyLock::new(|| load(include_str!("data/b2c_elements.json"), "b2c_elements.json"));
static B2B_ELEMENTS: LazyLock<Taxonomy> =
    LazyLock::new(|| load(include_str!("data/b2b_elements.json"), "b2b_elements.json"));
static CLIFTON_STRENGTHS: LazyLock<Taxonomy> = LazyLock::new(|| {
    load(include_str!("data/clifton_strengths.json"), "clifton_strengths.json")
});
static REVENUE_TRENDS: LazyLock<Taxonomy> =
    LazyLock::new(|| load(include_str!("data/revenue_trends.json"), "revenue_trends.json"));

/// Reference table for a framework
pub fn taxonomy(kind: FrameworkKind) -> &'static Taxonomy {
    match kind {
        FrameworkKind::GoldenCircle => &GOLDEN_CIRCLE,
        FrameworkKind::B2cElements => &B2C_ELEMENTS,
        FrameworkKind::B2bElements => &B2B_ELEMENTS,
        FrameworkKind::CliftonStrengths => &CLIFTON_STRENGTHS,
        FrameworkKind::RevenueTrends => &REVENUE_TRENDS,
    }
}

/// Elements whose signal phrases occur in the page text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSignal {
    pub element: String,
    pub category: String,
    pub matched: Vec<String>,
}

/// Case-insensitive substring scan of the page text for each element's
/// signal phrases
pub fn keyword_signals(taxonomy: &Taxonomy, text: &str) -> Vec<KeywordSignal> {
    let haystack = text.to_lowercase();
    taxonomy
        .elements()
        .filter_map(|entry| {
            let matched: Vec<String> = entry
                .element
                .keywords
                .iter()
                .filter(|k| haystack.contains(&k.to_lowercase()))
                .cloned()
                .collect();
            (!matched.is_empty()).then(|| KeywordSignal {
                element: entry.element.name.clone(),
                category: entry.category.to_string(),
                matched,
            })
        })
        .collect()
}
