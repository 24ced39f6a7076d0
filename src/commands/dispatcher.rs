use super::{CommandContext, CommandError, MaintenanceCommand, Report};
use crate::config::StoreConfig;
use crate::store::{HttpStore, ObjectStore, RecordStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs commands against one validated configuration and one set of store
/// clients.
pub struct Dispatcher {
    context: CommandContext,
}

impl Dispatcher {
    /// Create a dispatcher with explicitly injected store clients.
    pub fn new(
        config: StoreConfig,
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            context: CommandContext {
                config: Arc::new(config),
                records,
                objects,
            },
        }
    }

    /// Create a dispatcher backed by the REST API named in `config`.
    pub fn from_config(config: StoreConfig) -> Self {
        let store = Arc::new(HttpStore::new(&config));
        Self::new(config, store.clone(), store)
    }

    /// Run one command and log how it went.
    ///
    /// Errors are returned as-is; there is no retry.
    pub async fn dispatch(&self, command: &dyn MaintenanceCommand) -> Result<Report, CommandError> {
        let name = command.name().to_string();
        info!(command = %name, "Running command");
        let started = Instant::now();

        let result = command.run(&self.context).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(command = %name, elapsed_ms, "Command finished"),
            Err(e) => error!(command = %name, elapsed_ms, error = %e, "Command failed"),
        }
        result
    }
}
