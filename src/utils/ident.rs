//! Identifier checks for table and column names.
//!
//! Names end up in request paths and query strings, so anything outside
//! plain SQL identifiers is rejected before a request is built.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Check if a string is a valid table or column identifier
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Check if a comma-separated column list is `*` or only identifiers
pub fn is_valid_column_list(columns: &str) -> bool {
    if columns.trim() == "*" {
        return true;
    }
    columns
        .split(',')
        .map(str::trim)
        .all(|c| !c.is_empty() && is_valid_identifier(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_identifier("employees"));
        assert!(is_valid_identifier("time_records"));
        assert!(is_valid_identifier("_private"));
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1table"));
        assert!(!is_valid_identifier("employees;drop"));
        assert!(!is_valid_identifier("a b"));
        assert!(!is_valid_identifier("../x"));
    }

    #[test]
    fn test_column_lists() {
        assert!(is_valid_column_list("*"));
        assert!(is_valid_column_list("id,name"));
        assert!(is_valid_column_list("id, has_images, image_urls"));
        assert!(!is_valid_column_list("id,,name"));
        assert!(!is_valid_column_list("id,name()"));
        assert!(!is_valid_column_list(""));
    }
}
