//! Flag/items consistency reconciliation.
//!
//! Records carry a boolean flag claiming they have list items and a nullable
//! array holding them. `inspect` reports violations without writing;
//! `repair` clears the flag on records whose array is null.

mod inspect;
mod repair;
mod rule;
mod target;

pub use inspect::{inspect, InspectReport, InspectedRecord};
pub use repair::{repair, RepairReport};
pub use rule::{evaluate, is_accepted_url, Finding};
pub use target::{ReconcileTarget, Record, DEFAULT_URL_SCHEMES};

use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Failed to fetch records from {table}: {source}")]
    Fetch {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to update records in {table}: {source}")]
    Update {
        table: String,
        #[source]
        source: StoreError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Row};
    use serde_json::{json, Value};

    fn scenario_store() -> MemoryStore {
        let rows: Vec<Row> = vec![
            json!({"id": 1, "has_images": true, "image_urls": null}),
            json!({"id": 2, "has_images": true, "image_urls": ["http://a"]}),
            json!({"id": 3, "has_images": false, "image_urls": null}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
        MemoryStore::new().with_table("checklist_incidents", rows)
    }

    #[tokio::test]
    async fn test_repair_then_inspect_scenario() {
        let store = scenario_store();
        let target = ReconcileTarget::default();

        let report = repair(&store, &target, false).await.unwrap();
        assert_eq!(report.count(), 1);
        assert_eq!(report.ids, vec![json!(1)]);

        let inspected = inspect(&store, &target, target.flagged()).await.unwrap();
        assert_eq!(inspected.records.len(), 1);
        assert_eq!(inspected.records[0].id, json!(2));
        assert!(inspected.records[0].findings.is_empty());
    }

    #[tokio::test]
    async fn test_repair_is_idempotent() {
        let store = scenario_store();
        let target = ReconcileTarget::default();

        assert_eq!(repair(&store, &target, false).await.unwrap().count(), 1);
        assert_eq!(repair(&store, &target, false).await.unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let store = scenario_store();
        let target = ReconcileTarget::default();

        let report = repair(&store, &target, true).await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.ids, vec![json!(1)]);

        // still there for the real run
        assert_eq!(repair(&store, &target, false).await.unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_repair_leaves_empty_arrays() {
        let rows = vec![json!({"id": 9, "has_images": true, "image_urls": []})
            .as_object()
            .cloned()
            .unwrap()];
        let store = MemoryStore::new().with_table("checklist_incidents", rows);
        let target = ReconcileTarget::default();

        assert_eq!(repair(&store, &target, false).await.unwrap().count(), 0);

        let inspected = inspect(&store, &target, target.flagged()).await.unwrap();
        assert_eq!(inspected.findings_for(&json!(9)), &[Finding::EmptyList]);
    }

    #[tokio::test]
    async fn test_inspect_missing_table_is_fetch_error() {
        let store = MemoryStore::new();
        let target = ReconcileTarget::default();

        let err = inspect(&store, &target, target.flagged()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_rejected_write_is_update_error() {
        let store = MemoryStore::new();
        let target = ReconcileTarget::default();

        let err = repair(&store, &target, false).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Update { ref table, source: StoreError::Status { status: 404, .. } }
                if table == "checklist_incidents"
        ));

        // the dry run only reads
        let err = repair(&store, &target, true).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Fetch { .. }));
    }

    #[test]
    fn test_report_lines() {
        let report = InspectReport {
            table: "checklist_incidents".to_string(),
            records: vec![InspectedRecord {
                id: json!(4),
                flag: true,
                items: json!(["not-a-url", "http://ok.example/x"]),
                findings: vec![Finding::InvalidUrl {
                    value: json!("not-a-url"),
                }],
            }],
        };

        let text = report.to_string();
        assert!(text.contains("Record 4: flag=true"));
        assert_eq!(text.matches("WARNING [invalid URL]").count(), 1);
        assert!(text.contains("\"not-a-url\""));
        assert!(text.contains("1 with warnings (invalid URL: 1)"));

        let repaired = RepairReport {
            table: "checklist_incidents".to_string(),
            dry_run: false,
            ids: vec![Value::from(1), Value::from(5)],
        };
        assert!(repaired.to_string().contains("Updated 2 records"));
    }
}
