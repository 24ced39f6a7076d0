use super::{CommandContext, CommandError, MaintenanceCommand, Report};
use crate::store::{same_value, Filter, Query, Row};
use crate::utils::{count_label, display_value, is_valid_column_list, is_valid_identifier};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::info;

fn check_identifier(what: &str, name: &str) -> Result<(), CommandError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(CommandError::InvalidArgument(format!(
            "invalid {what} name: '{name}'"
        )))
    }
}

/// Prints the rows of a table, optionally filtered and limited.
#[derive(Debug, Clone)]
pub struct ListRows {
    pub table: String,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl Default for ListRows {
    fn default() -> Self {
        Self {
            table: "employees".to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowsReport {
    pub table: String,
    pub rows: Vec<Row>,
}

#[async_trait]
impl MaintenanceCommand for ListRows {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "Print the contents of a table"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<Report, CommandError> {
        check_identifier("table", &self.table)?;
        if !is_valid_column_list(&self.columns) {
            return Err(CommandError::InvalidArgument(format!(
                "invalid column list: '{}'",
                self.columns
            )));
        }
        for filter in &self.filters {
            check_identifier("filter column", filter.column())?;
        }

        let query = Query::new(self.columns.clone())
            .filters(self.filters.iter().cloned())
            .limit(self.limit);
        let rows = ctx
            .records
            .select(&self.table, &query)
            .await
            .map_err(|source| CommandError::Fetch {
                table: self.table.clone(),
                source,
            })?;

        info!(table = %self.table, count = rows.len(), "Fetched rows");
        Ok(Report::Rows(RowsReport {
            table: self.table.clone(),
            rows,
        }))
    }
}

impl fmt::Display for RowsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} in {}", count_label(self.rows.len(), "row"), self.table)?;
        for row in &self.rows {
            writeln!(f, "{}", Value::Object(row.clone()))?;
        }
        Ok(())
    }
}

/// Deletes specific rows, typically leftover test fixtures, by key.
#[derive(Debug, Clone)]
pub struct DeleteRows {
    pub table: String,
    pub key_column: String,
    pub keys: Vec<Value>,
}

impl Default for DeleteRows {
    fn default() -> Self {
        Self {
            table: "time_records".to_string(),
            key_column: "id".to_string(),
            keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub table: String,
    pub key_column: String,
    pub deleted: Vec<Value>,
    /// Requested keys that matched no row
    pub not_found: Vec<Value>,
}

#[async_trait]
impl MaintenanceCommand for DeleteRows {
    fn name(&self) -> &str {
        "delete-rows"
    }

    fn description(&self) -> &str {
        "Delete specific rows from a table by key"
    }

    async fn run(&self, ctx: &CommandContext) -> Result<Report, CommandError> {
        check_identifier("table", &self.table)?;
        check_identifier("key column", &self.key_column)?;
        // Never turn an empty key list into a table-wide delete
        if self.keys.is_empty() {
            return Err(CommandError::InvalidArgument(
                "at least one key is required".to_string(),
            ));
        }

        let filters = [Filter::is_in(self.key_column.clone(), self.keys.clone())];
        let rows = ctx
            .records
            .delete(&self.table, &filters)
            .await
            .map_err(|source| CommandError::Delete {
                table: self.table.clone(),
                source,
            })?;

        let deleted: Vec<Value> = rows
            .iter()
            .filter_map(|row| row.get(&self.key_column).cloned())
            .collect();
        let not_found: Vec<Value> = self
            .keys
            .iter()
            .filter(|key| !deleted.iter().any(|d| same_value(d, key)))
            .cloned()
            .collect();

        info!(
            table = %self.table,
            deleted = deleted.len(),
            not_found = not_found.len(),
            "Deleted rows"
        );

        Ok(Report::Deleted(DeleteReport {
            table: self.table.clone(),
            key_column: self.key_column.clone(),
            deleted,
            not_found,
        }))
    }
}

impl fmt::Display for DeleteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted {} from {}",
            count_label(self.deleted.len(), "row"),
            self.table
        )?;
        if !self.deleted.is_empty() {
            writeln!(f, "  {}: {}", self.key_column, join_values(&self.deleted))?;
        }
        if !self.not_found.is_empty() {
            writeln!(f, "  not found: {}", join_values(&self.not_found))?;
        }
        Ok(())
    }
}

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(", ")
}
