use super::target::ReconcileTarget;
use super::ReconcileError;
use crate::store::{Query, RecordStore, Row};
use crate::utils::{count_label, display_value};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::info;

/// Result of a repair run
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub table: String,
    /// True when nothing was written and `ids` lists what would have changed
    pub dry_run: bool,
    pub ids: Vec<Value>,
}

impl RepairReport {
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

/// Clear the flag on every record that claims items but holds null.
///
/// Issued as one bulk update so the store applies it atomically; running it
/// again once nothing matches updates zero rows. Empty arrays are not
/// touched.
pub async fn repair(
    store: &dyn RecordStore,
    target: &ReconcileTarget,
    dry_run: bool,
) -> Result<RepairReport, ReconcileError> {
    let predicate = target.flagged_without_items();

    let rows = if dry_run {
        let query = Query::new(target.id_column.clone()).filters(predicate);
        store
            .select(&target.table, &query)
            .await
            .map_err(|source| ReconcileError::Fetch {
                table: target.table.clone(),
                source,
            })?
    } else {
        let mut fields = Row::new();
        fields.insert(target.flag_column.clone(), Value::Bool(false));
        store
            .update(&target.table, &fields, &predicate)
            .await
            .map_err(|source| ReconcileError::Update {
                table: target.table.clone(),
                source,
            })?
    };

    let ids: Vec<Value> = rows
        .iter()
        .map(|row| row.get(&target.id_column).cloned().unwrap_or(Value::Null))
        .collect();

    info!(
        table = %target.table,
        dry_run,
        count = ids.len(),
        "Repair complete"
    );

    Ok(RepairReport {
        table: target.table.clone(),
        dry_run,
        ids,
    })
}

impl fmt::Display for RepairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ids.is_empty() {
            return writeln!(f, "No inconsistent records in {}; nothing to update", self.table);
        }
        let ids: Vec<String> = self.ids.iter().map(display_value).collect();
        let verb = if self.dry_run { "Would update" } else { "Updated" };
        writeln!(
            f,
            "{} {} in {} (flag cleared where items is null): {}",
            verb,
            count_label(self.count(), "record"),
            self.table,
            ids.join(", ")
        )
    }
}
