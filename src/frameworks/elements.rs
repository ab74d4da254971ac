use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::frameworks::{Taxonomy, name_key};

pub const B2B_TOTAL: usize = 42;
pub const B2B_TABLE_STAKES: usize = 4;
pub const B2B_FUNCTIONAL: usize = 9;
pub const B2B_FUNCTIONAL_ECONOMIC: usize = 2;
pub const B2B_FUNCTIONAL_PERFORMANCE: usize = 3;
pub const B2B_FUNCTIONAL_STRATEGIC: usize = 4;
pub const B2B_EASE_OF_DOING_BUSINESS: usize = 18;
pub const B2B_INDIVIDUAL: usize = 7;
pub const B2B_INSPIRATIONAL: usize = 4;

pub const B2C_TOTAL: usize = 30;
pub const B2C_FUNCTIONAL: usize = 14;
pub const B2C_EMOTIONAL: usize = 10;
pub const B2C_LIFE_CHANGING: usize = 5;
pub const B2C_SOCIAL_IMPACT: usize = 1;

/// Scores at or above this (0-10 scale) count as present when the model
/// gives a score but no explicit flag
const PRESENT_SCORE_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStatus {
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub present: bool,
    /// 0-10
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTally {
    pub category: String,
    pub present: usize,
    pub total: usize,
}

/// Element bookkeeping for an Elements of Value reply.
///
/// `present_elements + missing_elements == total_elements` for every tally,
/// whatever the model returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementsTally {
    pub total_elements: usize,
    pub present_elements: usize,
    pub missing_elements: usize,
    /// Taxonomy elements the reply named at all, present or not
    #[serde(default)]
    pub reported_elements: usize,
    pub categories: Vec<CategoryTally>,
    pub elements: Vec<ElementStatus>,
}

#[derive(Debug, Default, Clone)]
struct Reported {
    present: Option<bool>,
    score: Option<f64>,
    evidence: Option<String>,
}

impl Reported {
    fn merge(&mut self, other: Reported) {
        self.present = match (self.present, other.present) {
            (Some(a), Some(b)) => Some(a || b),
            (a, b) => a.or(b),
        };
        self.score = match (self.score, other.score) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        if self.evidence.is_none() {
            self.evidence = other.evidence;
        }
    }

    fn is_present(&self) -> bool {
        self.present
            .unwrap_or_else(|| self.score.is_some_and(|s| s >= PRESENT_SCORE_THRESHOLD))
    }
}

impl ElementsTally {
    /// Normalises a model reply against the fixed taxonomy.
    ///
    /// Element reports are read from an `elements` array (`name`, `present`,
    /// `score`, `evidence`) or from an object keyed by element name, at the
    /// top level or nested one level inside category objects. Unknown names
    /// are dropped, duplicates merged, and unreported elements count as
    /// missing.
    pub fn from_model(taxonomy: &Taxonomy, reply: &Value) -> Self {
        let mut reported: HashMap<String, Reported> = HashMap::new();
        collect_reports(reply, &mut reported, 0);

        let mut elements = Vec::with_capacity(taxonomy.total());
        let mut categories: Vec<CategoryTally> = Vec::new();
        let mut reported_elements = 0;

        for category in &taxonomy.categories {
            let mut tally = CategoryTally {
                category: category.name.clone(),
                present: 0,
                total: 0,
            };
            for entry in category.all_elements() {
                let report = match reported.get(&name_key(&entry.element.name)) {
                    Some(report) => {
                        reported_elements += 1;
                        report.clone()
                    }
                    None => Reported::default(),
                };
                let present = report.is_present();
                tally.total += 1;
                if present {
                    tally.present += 1;
                }
                elements.push(ElementStatus {
                    name: entry.element.name.clone(),
                    category: entry.category.to_string(),
                    subcategory: entry.subcategory.map(str::to_string),
                    present,
                    score: report.score,
                    evidence: report.evidence,
                });
            }
            categories.push(tally);
        }

        let total_elements = elements.len();
        let present_elements = elements.iter().filter(|e| e.present).count();

        Self {
            total_elements,
            present_elements,
            missing_elements: total_elements - present_elements,
            reported_elements,
            categories,
            elements,
        }
    }

    /// Writes the normalised bookkeeping back into the framework reply
    pub fn apply_to(&self, reply: &mut Value) {
        if !reply.is_object() {
            *reply = Value::Object(Map::new());
        }
        if let Value::Object(map) = reply {
            map.insert("totalElements".into(), self.total_elements.into());
            map.insert("presentElements".into(), self.present_elements.into());
            map.insert("missingElements".into(), self.missing_elements.into());
            map.insert(
                "categoryTallies".into(),
                serde_json::to_value(&self.categories).unwrap_or(Value::Null),
            );
            map.insert(
                "elements".into(),
                serde_json::to_value(&self.elements).unwrap_or(Value::Null),
            );
        }
    }
}

fn collect_reports(value: &Value, out: &mut HashMap<String, Reported>, depth: usize) {
    if depth > 3 {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                if let Some(name) = item.get("name").and_then(Value::as_str) {
                    insert(out, name, parse_report(item));
                } else {
                    collect_reports(item, out, depth + 1);
                }
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::Bool(present) => insert(
                        out,
                        key,
                        Reported {
                            present: Some(*present),
                            ..Reported::default()
                        },
                    ),
                    Value::Object(inner) if looks_like_report(inner) => {
                        let name = inner.get("name").and_then(Value::as_str).unwrap_or(key);
                        insert(out, name, parse_report(child));
                    }
                    Value::Object(_) | Value::Array(_) => collect_reports(child, out, depth + 1),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn looks_like_report(map: &Map<String, Value>) -> bool {
    map.contains_key("present") || map.contains_key("score") || map.contains_key("evidence")
}

fn insert(out: &mut HashMap<String, Reported>, name: &str, report: Reported) {
    out.entry(name_key(name)).or_default().merge(report);
}

fn parse_report(value: &Value) -> Reported {
    let present = match value.get("present") {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "present" => Some(true),
            "false" | "no" | "absent" | "missing" => Some(false),
            _ => None,
        },
        _ => None,
    };
    let score = value.get("score").and_then(Value::as_f64).map(normalize_score);
    let evidence = value
        .get("evidence")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Reported {
        present,
        score,
        evidence,
    }
}

/// Maps 0-10 or 0-100 scores onto 0-10
fn normalize_score(raw: f64) -> f64 {
    let scaled = if raw > 10.0 { raw / 10.0 } else { raw };
    scaled.clamp(0.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frameworks::taxonomy;
    use crate::results::FrameworkKind;
    use serde_json::json;

    fn b2b() -> &'static Taxonomy {
        taxonomy(FrameworkKind::B2bElements)
    }

    #[test]
    fn test_b2b_category_totals() {
        let table = b2b();
        assert_eq!(table.total(), B2B_TOTAL);
        let total = |name: &str| table.category(name).unwrap().total();
        assert_eq!(total("Table Stakes"), B2B_TABLE_STAKES);
        assert_eq!(total("Functional"), B2B_FUNCTIONAL);
        assert_eq!(total("Ease of Doing Business"), B2B_EASE_OF_DOING_BUSINESS);
        assert_eq!(total("Individual"), B2B_INDIVIDUAL);
        assert_eq!(total("Inspirational"), B2B_INSPIRATIONAL);

        assert_eq!(
            table.subcategory_total("Functional", "Economic"),
            Some(B2B_FUNCTIONAL_ECONOMIC)
        );
        assert_eq!(
            table.subcategory_total("Functional", "Performance"),
            Some(B2B_FUNCTIONAL_PERFORMANCE)
        );
        assert_eq!(
            table.subcategory_total("Functional", "Strategic"),
            Some(B2B_FUNCTIONAL_STRATEGIC)
        );
        assert_eq!(
            B2B_FUNCTIONAL_ECONOMIC + B2B_FUNCTIONAL_PERFORMANCE + B2B_FUNCTIONAL_STRATEGIC,
            B2B_FUNCTIONAL
        );
    }

    #[test]
    fn test_b2c_category_totals() {
        let table = taxonomy(FrameworkKind::B2cElements);
        assert_eq!(table.total(), B2C_TOTAL);
        let total = |name: &str| table.category(name).unwrap().total();
        assert_eq!(total("Functional"), B2C_FUNCTIONAL);
        assert_eq!(total("Emotional"), B2C_EMOTIONAL);
        assert_eq!(total("Life Changing"), B2C_LIFE_CHANGING);
        assert_eq!(total("Social Impact"), B2C_SOCIAL_IMPACT);
    }

    #[test]
    fn test_b2b_present_plus_missing_is_42_for_any_reply() {
        let replies = vec![
            json!({}),
            json!(null),
            json!("not even an object"),
            json!({"elements": []}),
            json!({"elements": [
                {"name": "Cost reduction", "present": true, "score": 8},
                {"name": "cost-reduction", "present": false},
                {"name": "Made up element", "present": true},
                {"name": "Scalability", "score": 7},
                {"name": "Innovation", "score": 2},
                {"name": "Vision", "present": "yes", "evidence": "  Reimagine work  "}
            ]}),
            json!({"tableStakes": {
                "Meeting specifications": {"present": true, "score": 90},
                "Acceptable price": true,
                "Regulatory compliance": false
            }}),
            json!({"presentElements": 99, "missingElements": -3}),
        ];

        for reply in replies {
            let tally = ElementsTally::from_model(b2b(), &reply);
            assert_eq!(tally.total_elements, B2B_TOTAL);
            assert_eq!(
                tally.present_elements + tally.missing_elements,
                B2B_TOTAL,
                "reply: {}",
                reply
            );
            assert_eq!(tally.elements.len(), B2B_TOTAL);
            let category_sum: usize = tally.categories.iter().map(|c| c.total).sum();
            assert_eq!(category_sum, B2B_TOTAL);
        }
    }

    #[test]
    fn test_reports_are_matched_and_merged() {
        let reply = json!({"elements": [
            {"name": "Cost reduction", "present": false, "score": 3},
            {"name": "COST REDUCTION", "present": true, "score": 8},
            {"name": "Scalability", "score": 7},
            {"name": "Innovation", "score": 20},
            {"name": "Vision", "present": "yes", "evidence": "  Reimagine work  "},
            {"name": "Unknown thing", "present": true}
        ]});
        let tally = ElementsTally::from_model(b2b(), &reply);
        let status = |name: &str| tally.elements.iter().find(|e| e.name == name).unwrap();

        assert!(status("Cost reduction").present);
        assert_eq!(status("Cost reduction").score, Some(8.0));
        assert!(status("Scalability").present);
        assert!(!status("Innovation").present);
        assert_eq!(status("Innovation").score, Some(2.0));
        assert!(status("Vision").present);
        assert_eq!(status("Vision").evidence.as_deref(), Some("Reimagine work"));
        assert_eq!(tally.present_elements, 3);
        assert_eq!(tally.missing_elements, 39);
        assert_eq!(tally.reported_elements, 4);

        let functional = tally
            .categories
            .iter()
            .find(|c| c.category == "Functional")
            .unwrap();
        assert_eq!(functional.present, 2);
        assert_eq!(functional.total, 9);
    }

    #[test]
    fn test_nested_category_objects() {
        let reply = json!({"categories": {"tableStakes": {
            "Meeting specifications": {"present": true, "score": 90},
            "Acceptable price": true,
            "Regulatory compliance": false
        }}});
        let tally = ElementsTally::from_model(b2b(), &reply);
        assert_eq!(tally.present_elements, 2);
        assert_eq!(tally.reported_elements, 3);
        let meeting = tally
            .elements
            .iter()
            .find(|e| e.name == "Meeting specifications")
            .unwrap();
        assert_eq!(meeting.score, Some(9.0));
    }

    #[test]
    fn test_apply_to_overwrites_model_counts() {
        let mut reply = json!({"presentElements": 99, "missingElements": -3, "overallScore": 70});
        let tally = ElementsTally::from_model(b2b(), &reply);
        tally.apply_to(&mut reply);
        assert_eq!(reply["presentElements"], 0);
        assert_eq!(reply["missingElements"], 42);
        assert_eq!(reply["totalElements"], 42);
        assert_eq!(reply["overallScore"], 70);
        assert_eq!(reply["elements"].as_array().unwrap().len(), 42);
        assert_eq!(tally.reported_elements, 0);
    }
}
