use super::rule::{evaluate, Finding};
use super::target::ReconcileTarget;
use super::ReconcileError;
use crate::store::{Filter, Query, RecordStore};
use crate::utils::{count_label, display_value};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// A record together with the findings the rule produced for it
#[derive(Debug, Clone, Serialize)]
pub struct InspectedRecord {
    pub id: Value,
    pub flag: bool,
    pub items: Value,
    pub findings: Vec<Finding>,
}

/// Result of a read-only consistency pass
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub table: String,
    pub records: Vec<InspectedRecord>,
}

impl InspectReport {
    /// Records with at least one finding
    pub fn inconsistent(&self) -> impl Iterator<Item = &InspectedRecord> {
        self.records.iter().filter(|r| !r.findings.is_empty())
    }

    /// Number of findings per tag
    pub fn warning_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for finding in self.records.iter().flat_map(|r| &r.findings) {
            *counts.entry(finding.tag()).or_insert(0) += 1;
        }
        counts
    }

    /// Findings for one record id, empty if the record was not inspected
    pub fn findings_for(&self, id: &Value) -> &[Finding] {
        self.records
            .iter()
            .find(|r| &r.id == id)
            .map(|r| r.findings.as_slice())
            .unwrap_or(&[])
    }
}

/// Fetch every record matching `predicate` and evaluate it.
///
/// One select, no writes. A failed select aborts the whole pass.
pub async fn inspect(
    store: &dyn RecordStore,
    target: &ReconcileTarget,
    predicate: Vec<Filter>,
) -> Result<InspectReport, ReconcileError> {
    let query = Query::new(target.columns()).filters(predicate);
    let rows = store
        .select(&target.table, &query)
        .await
        .map_err(|source| ReconcileError::Fetch {
            table: target.table.clone(),
            source,
        })?;

    let records: Vec<InspectedRecord> = rows
        .iter()
        .map(|row| {
            let record = target.record_from_row(row);
            let findings = evaluate(&record, &target.accepted_schemes);
            debug!(id = %display_value(&record.id), findings = findings.len(), "Evaluated record");
            InspectedRecord {
                id: record.id,
                flag: record.flag,
                items: record.items,
                findings,
            }
        })
        .collect();

    let report = InspectReport {
        table: target.table.clone(),
        records,
    };

    info!(
        table = %report.table,
        inspected = report.records.len(),
        inconsistent = report.inconsistent().count(),
        "Inspection complete"
    );

    Ok(report)
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(
                f,
                "Record {}: flag={} items={}",
                display_value(&record.id),
                record.flag,
                record.items
            )?;
            for finding in &record.findings {
                match finding {
                    Finding::InvalidUrl { value } => {
                        writeln!(f, "  WARNING [{}] {}", finding.tag(), value)?
                    }
                    _ => writeln!(f, "  WARNING [{}] items = {}", finding.tag(), record.items)?,
                }
            }
        }

        let counts = self.warning_counts();
        write!(
            f,
            "Inspected {} in {}: {} with warnings",
            count_label(self.records.len(), "record"),
            self.table,
            self.inconsistent().count()
        )?;
        if !counts.is_empty() {
            let parts: Vec<String> = counts
                .iter()
                .map(|(tag, n)| format!("{tag}: {n}"))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        writeln!(f)
    }
}
