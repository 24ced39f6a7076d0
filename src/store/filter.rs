//! Row filters and their PostgREST query-string form.

use super::Row;
use crate::utils::display_value;
use serde_json::Value;

/// A single column predicate. Filters in a list are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Not equal; rows where the column is null never match
    Neq(String, Value),
    IsNull(String),
    NotNull(String),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn neq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Neq(column.into(), value.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::IsNull(column.into())
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Filter::NotNull(column.into())
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In(column.into(), values)
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Neq(c, _)
            | Filter::IsNull(c)
            | Filter::NotNull(c)
            | Filter::In(c, _) => c,
        }
    }

    /// Operator half of the query parameter, e.g. `eq.true` or `in.(1,2)`
    pub fn to_param(&self) -> String {
        match self {
            Filter::Eq(_, v) => format!("eq.{}", display_value(v)),
            Filter::Neq(_, v) => format!("neq.{}", display_value(v)),
            Filter::IsNull(_) => "is.null".to_string(),
            Filter::NotNull(_) => "not.is.null".to_string(),
            Filter::In(_, values) => {
                let items: Vec<String> = values.iter().map(quote_list_item).collect();
                format!("in.({})", items.join(","))
            }
        }
    }

    /// Evaluate the filter against a row held in memory.
    ///
    /// Absent columns behave like SQL NULL. Scalars are compared in their
    /// query-string form, so `"12"` matches `12` the way the REST API
    /// coerces a literal to the column type.
    pub fn matches(&self, row: &Row) -> bool {
        let cell = row.get(self.column()).filter(|v| !v.is_null());
        match self {
            Filter::Eq(_, v) => cell.is_some_and(|c| same_value(c, v)),
            Filter::Neq(_, v) => cell.is_some_and(|c| !same_value(c, v)),
            Filter::IsNull(_) => cell.is_none(),
            Filter::NotNull(_) => cell.is_some(),
            Filter::In(_, values) => cell.is_some_and(|c| values.iter().any(|v| same_value(c, v))),
        }
    }
}

/// Compare a stored value with a filter literal.
///
/// Scalars match when their rendered text is equal; arrays and objects
/// need structural equality.
pub fn same_value(stored: &Value, literal: &Value) -> bool {
    let structured = |v: &Value| v.is_array() || v.is_object();
    if structured(stored) || structured(literal) {
        stored == literal
    } else {
        display_value(stored) == display_value(literal)
    }
}

/// Quote list members that contain PostgREST reserved characters
fn quote_list_item(value: &Value) -> String {
    let raw = display_value(value);
    let reserved = |c: char| matches!(c, ',' | '(' | ')' | '"' | '\\') || c.is_whitespace();
    if value.is_string() && raw.chars().any(reserved) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

/// Parse a `column=value` argument.
///
/// The value is kept as text and sent to the store verbatim; the store
/// coerces it to the column type.
pub fn parse_eq_arg(arg: &str) -> Option<Filter> {
    let (column, value) = arg.split_once('=')?;
    let column = column.trim();
    if column.is_empty() {
        return None;
    }
    Some(Filter::eq(column, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_params() {
        assert_eq!(Filter::eq("has_images", true).to_param(), "eq.true");
        assert_eq!(Filter::eq("name", "Ana").to_param(), "eq.Ana");
        assert_eq!(Filter::neq("id", 3).to_param(), "neq.3");
        assert_eq!(Filter::is_null("image_urls").to_param(), "is.null");
        assert_eq!(Filter::not_null("image_urls").to_param(), "not.is.null");
        assert_eq!(
            Filter::is_in("id", vec![json!(1), json!(2)]).to_param(),
            "in.(1,2)"
        );
    }

    #[test]
    fn test_in_quotes_reserved_characters() {
        let filter = Filter::is_in("name", vec![json!("a,b"), json!("plain"), json!("say \"hi\"")]);
        assert_eq!(filter.to_param(), r#"in.("a,b",plain,"say \"hi\"")"#);
    }

    #[test]
    fn test_matches_null_semantics() {
        let r = row(json!({"id": 1, "flag": true, "items": null}));

        assert!(Filter::is_null("items").matches(&r));
        assert!(Filter::is_null("missing").matches(&r));
        assert!(!Filter::not_null("items").matches(&r));
        assert!(Filter::eq("flag", true).matches(&r));
        assert!(!Filter::eq("flag", false).matches(&r));
        // NULL <> x is not true
        assert!(!Filter::neq("items", "x").matches(&r));
        assert!(Filter::neq("id", 2).matches(&r));
    }

    #[test]
    fn test_matches_in() {
        let r = row(json!({"id": "abc"}));
        assert!(Filter::is_in("id", vec![json!("x"), json!("abc")]).matches(&r));
        assert!(!Filter::is_in("id", vec![]).matches(&r));
    }

    #[test]
    fn test_text_literals_match_typed_columns() {
        let numeric = row(json!({"id": 12, "active": true}));
        assert!(Filter::eq("id", "12").matches(&numeric));
        assert!(Filter::eq("active", "true").matches(&numeric));
        assert!(!Filter::neq("id", "12").matches(&numeric));
        assert!(Filter::is_in("id", vec![json!("11"), json!("12")]).matches(&numeric));

        let text = row(json!({"code": "123"}));
        assert!(Filter::is_in("code", vec![json!("123")]).matches(&text));
        assert!(Filter::eq("code", 123).matches(&text));
        assert!(!Filter::eq("code", "0123").matches(&text));
    }

    #[test]
    fn test_same_value_keeps_structures_strict() {
        assert!(same_value(&json!(["a"]), &json!(["a"])));
        assert!(!same_value(&json!(["a"]), &json!("[\"a\"]")));
        assert!(same_value(&json!(1.5), &json!("1.5")));
    }

    #[test]
    fn test_parse_eq_arg() {
        assert_eq!(parse_eq_arg("active=true"), Some(Filter::eq("active", "true")));
        assert_eq!(parse_eq_arg("id=12"), Some(Filter::eq("id", "12")));
        assert_eq!(parse_eq_arg("name=Ana Lima"), Some(Filter::eq("name", "Ana Lima")));
        assert_eq!(parse_eq_arg("novalue"), None);
        assert_eq!(parse_eq_arg("=x"), None);
    }

    #[test]
    fn test_cli_literals_render_verbatim() {
        assert_eq!(parse_eq_arg("id=1e3").map(|f| f.to_param()), Some("eq.1e3".to_string()));
        assert_eq!(
            Filter::is_in("code", vec![json!("1e3"), json!("007")]).to_param(),
            "in.(1e3,007)"
        );
    }
}
