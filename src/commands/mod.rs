//! Maintenance commands and the dispatcher that runs them.
//!
//! # Overview
//!
//! - Each task is a `MaintenanceCommand` object carrying its own arguments
//! - The `Dispatcher` owns the validated configuration and the store clients
//!   and hands them to commands through a `CommandContext`
//! - The `CommandRegistry` lists what is available
//!
//! # Usage
//!
//! ```ignore
//! let dispatcher = Dispatcher::from_config(config);
//! let report = dispatcher.dispatch(&FixImages::default()).await?;
//! println!("{report}");
//! ```

mod dispatcher;
mod reconcile;
mod registry;
mod rows;
mod upload;

pub use dispatcher::Dispatcher;
pub use reconcile::{FixImages, InspectImages};
pub use registry::{create_registry, CommandInfo, CommandRegistry};
pub use rows::{DeleteReport, DeleteRows, ListRows, RowsReport};
pub use upload::{UploadReport, VerifyUpload};

use crate::config::StoreConfig;
use crate::reconciliation::{InspectReport, ReconcileError, RepairReport};
use crate::store::{ObjectStore, RecordStore, StoreError};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error types for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("Failed to fetch rows from {table}: {source}")]
    Fetch {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to delete rows from {table}: {source}")]
    Delete {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("Storage {operation} failed for {bucket}/{path}: {source}")]
    Storage {
        operation: &'static str,
        bucket: String,
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Everything a command may touch while it runs.
#[derive(Clone)]
pub struct CommandContext {
    pub config: Arc<StoreConfig>,
    pub records: Arc<dyn RecordStore>,
    pub objects: Arc<dyn ObjectStore>,
}

/// Trait for a single maintenance task.
///
/// A command is built with its arguments and run once. It must not build
/// its own store clients; everything comes from the context.
#[async_trait]
pub trait MaintenanceCommand: Send + Sync {
    /// Name used on the command line.
    fn name(&self) -> &str;

    /// One-line summary of what the command does.
    fn description(&self) -> &str;

    /// Run the command to completion.
    async fn run(&self, ctx: &CommandContext) -> Result<Report, CommandError>;
}

/// Outcome of a command, printable as console lines or serializable as JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Inspect(InspectReport),
    Repair(RepairReport),
    Rows(RowsReport),
    Deleted(DeleteReport),
    Upload(UploadReport),
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Inspect(r) => fmt::Display::fmt(r, f),
            Report::Repair(r) => fmt::Display::fmt(r, f),
            Report::Rows(r) => fmt::Display::fmt(r, f),
            Report::Deleted(r) => fmt::Display::fmt(r, f),
            Report::Upload(r) => fmt::Display::fmt(r, f),
        }
    }
}
