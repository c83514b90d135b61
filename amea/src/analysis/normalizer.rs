//! Turns free-form or JSON model replies into fixed-shape structures.
//!
//! Nothing in here fails: malformed input yields empty fields, which callers
//! treat as "use the fallback".

use crate::analysis::scoring::ScoreBreakdown;
use crate::analysis::types::{CompanyBrief, MarketSnapshot, BRIEF_SECTIONS};
use crate::types::{Pestel, PestelDimension};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

type Object = Map<String, Value>;

const PESTEL_KEYS: [&str; 3] = ["pestel", "PESTEL", "Pestel"];
const SCORE_KEYS: [&str; 2] = ["scores", "score"];
const SIGNAL_KEYS: [&str; 3] = ["recent_signals", "news", "signals"];
const MITIGATION_KEYS: [&str; 3] = ["turnaround_actions", "mitigations", "risk_mitigations"];
const RESERVED_SCORE_KEYS: [&str; 3] = ["composite", "overall", "dimensions"];

/// Parse a reply as JSON, recovering an object wrapped in prose.
///
/// Tries the whole text, then the first `{` .. last `}` span (or first `[`
/// .. last `]` when there are no braces). A top-level array resolves to its
/// first object element.
pub fn parse_json_payload(raw: &str) -> Option<Object> {
    let text = raw.trim();
    let value = serde_json::from_str::<Value>(text)
        .ok()
        .or_else(|| embedded_span(text).and_then(|span| serde_json::from_str(span).ok()))?;

    match value {
        Value::Object(obj) => Some(obj),
        Value::Array(items) => items.into_iter().find_map(|item| match item {
            Value::Object(obj) => Some(obj),
            _ => None,
        }),
        _ => None,
    }
}

fn embedded_span(text: &str) -> Option<&str> {
    if text.contains('{') {
        span_between(text, '{', '}')
    } else {
        span_between(text, '[', ']')
    }
}

fn span_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Normalize a market snapshot reply.
pub fn normalize(raw: &str) -> MarketSnapshot {
    match parse_json_payload(raw) {
        Some(obj) => normalize_object(&obj),
        None => MarketSnapshot::default(),
    }
}

pub fn normalize_object(obj: &Object) -> MarketSnapshot {
    MarketSnapshot {
        summary: scalar_text(lookup(obj, "summary")),
        pestel: normalize_pestel(obj),
        scores: normalize_scores(lookup_any(obj, &SCORE_KEYS)),
        recent_signals: clean_list(lookup_any(obj, &SIGNAL_KEYS)),
        entry_mode: scalar_text(lookup(obj, "entry_mode")),
        mitigations: clean_mapping(lookup_any(obj, &MITIGATION_KEYS)),
        recommendations: clean_list(lookup(obj, "recommendations")),
        sources: clean_list(lookup(obj, "sources")),
    }
}

/// Six PESTEL dimensions from a `pestel` sub-object, or from the top level.
pub fn normalize_pestel(obj: &Object) -> Pestel {
    let source = match lookup_any(obj, &PESTEL_KEYS) {
        Some(Value::Object(inner)) => inner,
        _ => obj,
    };

    let mut pestel = Pestel::default();
    for dimension in PestelDimension::ALL {
        *pestel.get_mut(dimension) = pestel_bullets(lookup(source, dimension.name()));
    }
    pestel
}

fn pestel_bullets(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(stringify).collect(),
        Some(other) => stringify(other).into_iter().collect(),
        None => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
        .collect()
}

/// Nested `dimensions` object, or a flat object minus the reserved keys.
/// Keys are matched case-insensitively and come back in `snake_case`.
pub fn normalize_scores(value: Option<&Value>) -> ScoreBreakdown {
    let obj = match value {
        Some(Value::Object(obj)) => obj,
        Some(other) => {
            return ScoreBreakdown {
                dimension_scores: BTreeMap::new(),
                composite: coerce_f64(other).unwrap_or(0.0),
            }
        }
        None => return ScoreBreakdown::default(),
    };

    let composite = score_field(obj, "composite")
        .and_then(coerce_f64)
        .or_else(|| score_field(obj, "overall").and_then(coerce_f64))
        .unwrap_or(0.0);

    let dimension_scores = match score_field(obj, "dimensions") {
        Some(Value::Object(dims)) => scored_entries(dims.iter()),
        _ => scored_entries(
            obj.iter()
                .filter(|(k, _)| !RESERVED_SCORE_KEYS.contains(&score_key(k).as_str())),
        ),
    };

    ScoreBreakdown {
        dimension_scores,
        composite,
    }
}

/// "Cost Efficiency", "cost-efficiency" and "COST_EFFICIENCY" all map to `cost_efficiency`.
fn score_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn score_field<'a>(obj: &'a Object, name: &str) -> Option<&'a Value> {
    obj.iter()
        .find(|(k, _)| score_key(k) == name)
        .map(|(_, v)| v)
}

fn scored_entries<'a>(
    entries: impl Iterator<Item = (&'a String, &'a Value)>,
) -> BTreeMap<String, f64> {
    entries
        .filter_map(|(k, v)| {
            let key = score_key(k);
            if key.is_empty() {
                return None;
            }
            coerce_f64(v).map(|score| (key, score))
        })
        .collect()
}

/// String -> one element, list -> trimmed non-empty elements, otherwise empty.
pub fn clean_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(stringify).collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Object of theme -> text with null and blank values dropped.
pub fn clean_mapping(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(obj)) = value else {
        return BTreeMap::new();
    };
    obj.iter()
        .filter_map(|(k, v)| {
            let text = stringify(v)?.trim().to_string();
            (!text.is_empty()).then(|| (k.clone(), text))
        })
        .collect()
}

/// Company brief reply. A JSON object fills the profile and sections; plain
/// prose becomes the profile summary.
pub fn normalize_brief(raw: &str) -> CompanyBrief {
    let Some(obj) = parse_json_payload(raw) else {
        return CompanyBrief {
            profile_summary: raw.trim().to_string(),
            ..CompanyBrief::default()
        };
    };

    let mut brief = CompanyBrief {
        profile_summary: scalar_text(
            lookup(&obj, "profile_summary").or_else(|| lookup(&obj, "summary")),
        ),
        ..CompanyBrief::default()
    };
    for (key, _) in BRIEF_SECTIONS {
        if let Some(section) = brief.section_mut(key) {
            *section = clean_list(lookup(&obj, key));
        }
    }
    brief
}

/// Exact, then lowercase, then uppercase key. Null counts as missing.
fn lookup<'a>(obj: &'a Object, name: &str) -> Option<&'a Value> {
    [name.to_string(), name.to_lowercase(), name.to_uppercase()]
        .iter()
        .find_map(|k| obj.get(k).filter(|v| !v.is_null()))
}

fn lookup_any<'a>(obj: &'a Object, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|n| lookup(obj, n))
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(_)) | Some(Value::Object(_)) | None => String::new(),
        Some(v) => stringify(v).unwrap_or_default().trim().to_string(),
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FULL: &str = r#"{
        "summary": "Attractive but competitive.",
        "pestel": {
            "Political": ["Stable coalition", "  EU alignment  "],
            "Economic": ["GDP growth 0.3%"],
            "Social": ["Ageing population"],
            "Technological": ["Strong broadband"],
            "Environmental": ["Energiewende"],
            "Legal": ["Supply chain act"]
        },
        "scores": {"dimensions": {"growth": 62, "risk": "81.5", "digital": "n/a"}, "composite": 70},
        "recent_signals": ["PMI below 50", ""],
        "entry_mode": " Joint venture ",
        "turnaround_actions": {"risk": "Hedge energy costs", "growth": null, "digital": "  "},
        "recommendations": "Start in Bavaria",
        "sources": ["Destatis", null, 2024]
    }"#;

    #[test]
    fn full_reply_preserves_trimmed_bullets_in_order() {
        let s = normalize(FULL);
        assert_eq!(s.summary, "Attractive but competitive.");
        assert_eq!(s.pestel.political, vec!["Stable coalition", "EU alignment"]);
        assert_eq!(s.pestel.legal, vec!["Supply chain act"]);
        assert_eq!(s.recent_signals, vec!["PMI below 50"]);
        assert_eq!(s.entry_mode, "Joint venture");
        assert_eq!(s.recommendations, vec!["Start in Bavaria"]);
        assert_eq!(s.sources, vec!["Destatis", "2024"]);
        assert_eq!(s.mitigations.len(), 1);
        assert_eq!(s.mitigations["risk"], "Hedge energy costs");
    }

    #[test]
    fn scores_coerce_and_discard() {
        let s = normalize(FULL);
        assert_eq!(s.scores.composite, 70.0);
        assert_eq!(s.scores.dimension_scores.len(), 2);
        assert_eq!(s.scores.score("risk"), 81.5);
        assert_eq!(s.scores.score("digital"), 0.0);
    }

    #[test]
    fn flat_scores_exclude_reserved_keys() {
        let v = serde_json::json!({
            "growth": 70, "cost_efficiency": "40", "overall": 55, "note": "x"
        });
        let s = normalize_scores(Some(&v));
        assert_eq!(s.composite, 55.0);
        assert_eq!(
            s.dimension_scores.keys().collect::<Vec<_>>(),
            vec!["cost_efficiency", "growth"]
        );

        let v = serde_json::json!({"growth": 70, "composite": "bad"});
        let s = normalize_scores(Some(&v));
        assert_eq!(s.composite, 0.0);
        assert_eq!(s.score("growth"), 70.0);
    }

    #[test]
    fn score_keys_are_case_and_separator_insensitive() {
        let v = serde_json::json!({
            "Dimensions": {"Growth": 85, " RISK ": 75, "Cost Efficiency": "40", "brand-equity": 10},
            "Composite": 80
        });
        let s = normalize_scores(Some(&v));
        assert_eq!(s.composite, 80.0);
        assert_eq!(
            s.dimension_scores.keys().collect::<Vec<_>>(),
            vec!["brand_equity", "cost_efficiency", "growth", "risk"]
        );
        assert_eq!(s.score("growth"), 85.0);

        let v = serde_json::json!({"Growth": 70, "OVERALL": 66});
        let s = normalize_scores(Some(&v));
        assert_eq!(s.composite, 66.0);
        assert_eq!(s.dimension_scores.keys().collect::<Vec<_>>(), vec!["growth"]);
    }

    #[test]
    fn single_string_dimension_becomes_one_element() {
        let s = normalize(r#"{"pestel": {"Political": "  Stable governance  "}}"#);
        assert_eq!(s.pestel.political, vec!["Stable governance"]);
    }

    #[test]
    fn missing_dimensions_are_empty_lists() {
        let s = normalize(r#"{"pestel": {"Economic": ["Growth"]}}"#);
        assert_eq!(s.pestel.economic, vec!["Growth"]);
        for (dimension, bullets) in s.pestel.iter() {
            if dimension != PestelDimension::Economic {
                assert!(bullets.is_empty(), "{dimension} should be empty");
            }
        }
    }

    #[test]
    fn dimension_keys_tolerate_case() {
        let s = normalize(r#"{"political": ["lower"], "ECONOMIC": ["upper"], "Social": "exact"}"#);
        assert_eq!(s.pestel.political, vec!["lower"]);
        assert_eq!(s.pestel.economic, vec!["upper"]);
        assert_eq!(s.pestel.social, vec!["exact"]);
    }

    #[test]
    fn none_tokens_and_blanks_are_dropped() {
        let s = normalize(r#"{"Legal": ["None", " none ", "", "Data residency", null, 5]}"#);
        assert_eq!(s.pestel.legal, vec!["Data residency", "5"]);
        let s = normalize(r#"{"Legal": "NONE"}"#);
        assert!(s.pestel.legal.is_empty());
    }

    #[test]
    fn json_wrapped_in_prose_is_recovered() {
        let raw = "Sure, here it is:\n\
            {\"pestel\": {\"Social\": [\"Urban\"]}, \"entry_mode\": \"JV\"}\n\
            Hope that helps";
        let s = normalize(raw);
        assert_eq!(s.pestel.social, vec!["Urban"]);
        assert_eq!(s.entry_mode, "JV");
    }

    #[test]
    fn array_span_used_when_no_braces() {
        assert!(parse_json_payload("list: [1, 2] done").is_none());
        let obj = parse_json_payload(r#"[{"entry_mode": "Export"}]"#).unwrap();
        assert_eq!(obj["entry_mode"], "Export");
    }

    #[test]
    fn unparsable_text_yields_empty_structure() {
        assert!(normalize("I cannot help with that.").is_empty());
        assert!(normalize("{not json at all}").is_empty());
        assert!(normalize("").is_empty());
    }

    #[test]
    fn normalizing_twice_is_identical() {
        assert_eq!(normalize(FULL), normalize(FULL));
    }

    #[test]
    fn brief_from_json_and_from_prose() {
        let brief = normalize_brief(
            r#"{"profile_summary": "Acme sells tools.", "core_offerings": ["Drills", " Saws "], "key_risks": "Tariffs"}"#,
        );
        assert_eq!(brief.profile_summary, "Acme sells tools.");
        assert_eq!(brief.core_offerings, vec!["Drills", "Saws"]);
        assert_eq!(brief.key_risks, vec!["Tariffs"]);
        assert!(brief.target_customers.is_empty());

        let brief = normalize_brief("  Acme serves contractors.  ");
        assert_eq!(brief.profile_summary, "Acme serves contractors.");
        assert!(brief.sections().all(|(_, b)| b.is_empty()));
    }

    proptest! {
        #[test]
        fn normalize_never_panics_and_is_idempotent(raw in ".{0,200}") {
            let first = normalize(&raw);
            let second = normalize(&raw);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn pestel_arrays_keep_every_non_empty_item(
            items in proptest::collection::vec("[a-zA-Z0-9 ]{0,12}", 0..6)
        ) {
            let payload = serde_json::json!({ "pestel": { "Technological": items.clone() } });
            let s = normalize(&payload.to_string());
            let expected: Vec<String> = items
                .iter()
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty() && !i.eq_ignore_ascii_case("none"))
                .collect();
            prop_assert_eq!(s.pestel.technological, expected);
        }
    }
}
