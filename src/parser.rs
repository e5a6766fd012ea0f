//! Lenient extraction of job candidates from search response text.
//!
//! The provider is asked for a bare JSON array but often wraps it in prose or a
//! markdown fence. Extraction tries, in order: the whole text, each fenced block,
//! then the first array of objects starting at any `[`. Entries that are not objects
//! or have no http(s) URL are dropped; nothing here ever fails the batch.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub url: Option<String>,
    pub requirements_raw: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    /// The response text exactly as received.
    pub raw: String,
    pub candidates: Vec<Candidate>,
    /// Entries excluded as malformed or missing a URL.
    pub dropped: usize,
}

pub fn parse_response(raw: &str) -> ParsedResponse {
    let entries = match extract_json(raw) {
        Some(Value::Array(items)) => items,
        Some(obj @ Value::Object(_)) => vec![obj],
        Some(_) | None => {
            debug!("no JSON array found in search response");
            Vec::new()
        }
    };

    let mut candidates = Vec::new();
    let mut dropped = 0;
    for entry in &entries {
        match entry.as_object().and_then(to_candidate) {
            Some(candidate) => candidates.push(candidate),
            None => dropped += 1,
        }
    }

    ParsedResponse {
        raw: raw.to_string(),
        candidates,
        dropped,
    }
}

fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Ok(fence) = Regex::new(r"```(?:json)?\s*([\s\S]*?)```") {
        for cap in fence.captures_iter(raw) {
            let Some(body) = cap.get(1) else { continue };
            if let Ok(value) = serde_json::from_str(body.as_str().trim()) {
                return Some(value);
            }
        }
    }

    // Prose may carry its own brackets ("Found [3] jobs"), so take the first
    // array, from any `[`, that holds at least one object.
    raw.match_indices('[').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Array(items))) if items.iter().any(Value::is_object) => {
                Some(Value::Array(items))
            }
            _ => None,
        }
    })
}

fn to_candidate(obj: &Map<String, Value>) -> Option<Candidate> {
    let url = text_field(obj, &["url", "link"]).filter(|u| is_http_url(u));
    let Some(url) = url else {
        debug!(?obj, "dropping entry without usable url");
        return None;
    };

    Some(Candidate {
        title: text_field(obj, &["title"]),
        company_name: text_field(obj, &["company", "company_name"]),
        url: Some(url),
        requirements_raw: text_field(obj, &["requirements", "requirements_raw"]),
    })
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = match obj.get(*key)? {
            Value::String(s) => s.trim().to_string(),
            // Some responses list requirements as an array of strings.
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    })
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array() {
        let raw = r#"[{"title": "Data Analyst", "company": "Uniswap", "url": "https://uniswap.org/careers/1", "requirements": "SQL, Python, 3+ years"}]"#;
        let parsed = parse_response(raw);
        assert_eq!(parsed.dropped, 0);
        assert_eq!(
            parsed.candidates,
            vec![Candidate {
                title: Some("Data Analyst".to_string()),
                company_name: Some("Uniswap".to_string()),
                url: Some("https://uniswap.org/careers/1".to_string()),
                requirements_raw: Some("SQL, Python, 3+ years".to_string()),
            }]
        );
        assert_eq!(parsed.raw, raw);
    }

    #[test]
    fn parses_fenced_block_with_prose() {
        let raw = "Here are the jobs I found:\n```json\n[{\"title\": \"Analytics Engineer\", \"company\": \"Dune\", \"url\": \"https://dune.com/jobs/2\"}]\n```\nGood luck!";
        let parsed = parse_response(raw);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].company_name.as_deref(), Some("Dune"));
        assert!(parsed.candidates[0].requirements_raw.is_none());
    }

    #[test]
    fn parses_array_embedded_in_prose() {
        let raw = "Results: [{\"title\": \"SQL Dev\", \"url\": \"https://a.example/1\"}] (2 more pending)";
        let parsed = parse_response(raw);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].title.as_deref(), Some("SQL Dev"));
    }

    #[test]
    fn skips_bracketed_prose_before_the_array() {
        let raw = "Found [3] jobs: [{\"title\": \"SQL Dev\", \"url\": \"https://a.example/1\"}] see [1]";
        let parsed = parse_response(raw);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].url.as_deref(), Some("https://a.example/1"));
    }

    #[test]
    fn single_object_is_one_candidate() {
        let parsed = parse_response(r#"{"title": "Quant", "url": "https://a.example/q"}"#);
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn drops_entries_without_usable_url() {
        let raw = r#"[
            {"title": "No URL", "company": "Acme"},
            {"title": "Relative", "url": "/jobs/3"},
            {"title": "Blank", "url": "   "},
            "not an object",
            {"title": "Good", "url": "HTTPS://a.example/ok"}
        ]"#;
        let parsed = parse_response(raw);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].title.as_deref(), Some("Good"));
        assert_eq!(parsed.dropped, 4);
    }

    #[test]
    fn accepts_field_aliases_and_requirement_lists() {
        let raw = r#"[{"title": " BI Analyst ", "company_name": "Nansen", "link": "https://nansen.ai/j", "requirements": ["SQL", " dbt ", ""]}]"#;
        let c = &parse_response(raw).candidates[0];
        assert_eq!(c.title.as_deref(), Some("BI Analyst"));
        assert_eq!(c.company_name.as_deref(), Some("Nansen"));
        assert_eq!(c.url.as_deref(), Some("https://nansen.ai/j"));
        assert_eq!(c.requirements_raw.as_deref(), Some("SQL, dbt"));
    }

    #[test]
    fn garbage_yields_nothing() {
        for raw in ["", "I couldn't find any jobs.", "[not json]", "42", "] backwards ["] {
            let parsed = parse_response(raw);
            assert!(parsed.candidates.is_empty(), "{raw:?}");
            assert_eq!(parsed.raw, raw);
        }
    }

    #[test]
    fn empty_array_is_not_an_error() {
        let parsed = parse_response("[]");
        assert!(parsed.candidates.is_empty());
        assert_eq!(parsed.dropped, 0);
    }

    #[test]
    fn parsing_is_deterministic() {
        let raw = "```\n[{\"title\": \"A\", \"url\": \"https://a.example/1\"}, {\"title\": \"B\"}]\n```";
        let first = parse_response(raw);
        let second = parse_response(raw);
        assert_eq!(first.candidates, second.candidates);
        assert_eq!(first.dropped, second.dropped);
    }
}
