//! The flag/items consistency rule.
//!
//! A record whose flag is true must hold a non-empty array of strings, each
//! starting with an accepted scheme. `evaluate` is pure; it never looks at
//! the store.

use super::target::Record;
use serde::Serialize;
use serde_json::Value;

/// One violation found on a record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// `items` is null, absent, or some other non-array value
    NotAnArray,
    /// An array element that is not a string with an accepted prefix
    InvalidUrl { value: Value },
    /// Flag is true but the array is empty. Reported only; repair leaves it alone.
    EmptyList,
}

impl Finding {
    pub fn tag(&self) -> &'static str {
        match self {
            Finding::NotAnArray => "not an array",
            Finding::InvalidUrl { .. } => "invalid URL",
            Finding::EmptyList => "empty list",
        }
    }
}

/// Evaluate one record against the rule.
///
/// Non-array items yield exactly one `NotAnArray` and nothing else. A null
/// or absent value on an unflagged record is consistent.
pub fn evaluate(record: &Record, schemes: &[String]) -> Vec<Finding> {
    match &record.items {
        Value::Array(items) if items.is_empty() => {
            if record.flag {
                vec![Finding::EmptyList]
            } else {
                Vec::new()
            }
        }
        Value::Array(items) => items
            .iter()
            .filter(|item| !is_accepted_url(item, schemes))
            .map(|item| Finding::InvalidUrl {
                value: item.clone(),
            })
            .collect(),
        Value::Null if !record.flag => Vec::new(),
        _ => vec![Finding::NotAnArray],
    }
}

/// Check if a value is a string starting with one of the accepted prefixes
pub fn is_accepted_url(value: &Value, schemes: &[String]) -> bool {
    value
        .as_str()
        .is_some_and(|s| schemes.iter().any(|scheme| s.starts_with(scheme.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::target::DEFAULT_URL_SCHEMES;
    use serde_json::json;

    fn schemes() -> Vec<String> {
        DEFAULT_URL_SCHEMES.iter().map(|s| s.to_string()).collect()
    }

    fn record(flag: bool, items: Value) -> Record {
        Record {
            id: json!(1),
            flag,
            items,
        }
    }

    #[test]
    fn test_valid_urls_have_no_findings() {
        let r = record(
            true,
            json!(["http://a.example/1.jpg", "https://b.example/2.png"]),
        );
        assert!(evaluate(&r, &schemes()).is_empty());
    }

    #[test]
    fn test_one_invalid_url_among_valid() {
        let r = record(true, json!(["not-a-url", "http://ok.example/x"]));
        let findings = evaluate(&r, &schemes());
        assert_eq!(
            findings,
            vec![Finding::InvalidUrl {
                value: json!("not-a-url")
            }]
        );
    }

    #[test]
    fn test_non_string_items_are_invalid() {
        let r = record(true, json!([42, null, {"url": "http://x"}]));
        let findings = evaluate(&r, &schemes());
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.tag() == "invalid URL"));
    }

    #[test]
    fn test_non_array_yields_single_finding() {
        for items in [json!("http://a.example/x"), json!({"0": "http://a"}), json!(5)] {
            let findings = evaluate(&record(true, items), &schemes());
            assert_eq!(findings, vec![Finding::NotAnArray]);
        }
    }

    #[test]
    fn test_null_items() {
        assert_eq!(
            evaluate(&record(true, Value::Null), &schemes()),
            vec![Finding::NotAnArray]
        );
        assert!(evaluate(&record(false, Value::Null), &schemes()).is_empty());
    }

    #[test]
    fn test_empty_list_only_matters_when_flagged() {
        assert_eq!(
            evaluate(&record(true, json!([])), &schemes()),
            vec![Finding::EmptyList]
        );
        assert!(evaluate(&record(false, json!([])), &schemes()).is_empty());
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert!(!is_accepted_url(&json!("HTTP://a"), &schemes()));
        assert!(!is_accepted_url(&json!("ftp://a"), &schemes()));
        assert!(is_accepted_url(&json!("https://a"), &schemes()));
    }
}
