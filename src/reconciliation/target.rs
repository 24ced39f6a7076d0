use crate::store::{Filter, Row};
use crate::utils::is_valid_identifier;
use serde::Serialize;
use serde_json::Value;

/// URI prefixes accepted for list items
pub const DEFAULT_URL_SCHEMES: &[&str] = &["http://", "https://"];

/// The table and columns holding the flag/items pair being reconciled
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileTarget {
    pub table: String,
    pub id_column: String,
    /// Boolean column asserting that the record has list items
    pub flag_column: String,
    /// Nullable array column holding the item URLs
    pub items_column: String,
    pub accepted_schemes: Vec<String>,
}

impl Default for ReconcileTarget {
    fn default() -> Self {
        Self {
            table: "checklist_incidents".to_string(),
            id_column: "id".to_string(),
            flag_column: "has_images".to_string(),
            items_column: "image_urls".to_string(),
            accepted_schemes: DEFAULT_URL_SCHEMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ReconcileTarget {
    /// Check that every configured name is a plain identifier
    pub fn validate(&self) -> Result<(), String> {
        for (what, name) in [
            ("table", &self.table),
            ("id column", &self.id_column),
            ("flag column", &self.flag_column),
            ("items column", &self.items_column),
        ] {
            if !is_valid_identifier(name) {
                return Err(format!("invalid {what} name: '{name}'"));
            }
        }
        Ok(())
    }

    /// `id, flag, items` column list for selects
    pub fn columns(&self) -> String {
        format!("{},{},{}", self.id_column, self.flag_column, self.items_column)
    }

    /// Records claiming to have items: `flag = true`
    pub fn flagged(&self) -> Vec<Filter> {
        vec![Filter::eq(&self.flag_column, true)]
    }

    /// Records claiming items while holding none: `flag = true AND items IS NULL`
    pub fn flagged_without_items(&self) -> Vec<Filter> {
        vec![
            Filter::eq(&self.flag_column, true),
            Filter::is_null(&self.items_column),
        ]
    }

    /// Read the reconciled fields out of a raw row
    pub fn record_from_row(&self, row: &Row) -> Record {
        Record {
            id: row.get(&self.id_column).cloned().unwrap_or(Value::Null),
            flag: row
                .get(&self.flag_column)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            items: row.get(&self.items_column).cloned().unwrap_or(Value::Null),
        }
    }
}

/// A record as seen by the reconciler. Absent `items` is held as `Null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: Value,
    pub flag: bool,
    pub items: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_target_is_valid() {
        assert!(ReconcileTarget::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_names() {
        let target = ReconcileTarget {
            items_column: "image_urls;--".to_string(),
            ..Default::default()
        };
        let err = target.validate().unwrap_err();
        assert!(err.contains("items column"));
    }

    #[test]
    fn test_record_from_row_defaults() {
        let target = ReconcileTarget::default();
        let row = json!({"id": 7}).as_object().cloned().unwrap();

        let record = target.record_from_row(&row);
        assert_eq!(record.id, json!(7));
        assert!(!record.flag);
        assert_eq!(record.items, Value::Null);
    }

    #[test]
    fn test_predicates() {
        let target = ReconcileTarget::default();
        assert_eq!(target.flagged(), vec![Filter::eq("has_images", true)]);
        assert_eq!(
            target.flagged_without_items(),
            vec![Filter::eq("has_images", true), Filter::is_null("image_urls")]
        );
        assert_eq!(target.columns(), "id,has_images,image_urls");
    }
}
