pub mod commands;
pub mod config;
pub mod reconciliation;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use commands::{
    create_registry, CommandContext, CommandError, CommandInfo, CommandRegistry, DeleteReport,
    DeleteRows, Dispatcher, FixImages, InspectImages, ListRows, MaintenanceCommand, Report,
    RowsReport, UploadReport, VerifyUpload,
};
pub use config::{read_config, ConfigError, RawConfig, StoreConfig};
pub use reconciliation::{
    evaluate, inspect, repair, Finding, InspectReport, ReconcileError, ReconcileTarget, Record,
    RepairReport,
};
pub use store::{Filter, HttpStore, MemoryStore, ObjectStore, Query, RecordStore, Row, StoreError};
