use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use store_maint::utils::DEFAULT_PROBE_PREFIX;
use store_maint::{
    create_registry, read_config, ConfigError, DeleteRows, Dispatcher, Filter, FixImages,
    InspectImages, ListRows, MaintenanceCommand, RawConfig, ReconcileTarget, StoreConfig,
    VerifyUpload,
};
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit status when required configuration is missing or invalid
const CONFIG_EXIT_CODE: u8 = 2;

/// Store Maint - one-shot maintenance commands for the hosted record store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file with storeEndpoint, accessKey and photoBucket
    #[arg(long, global = true, env = "STORE_MAINT_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base URL of the record store
    #[arg(long, global = true, env = "STORE_ENDPOINT", value_name = "URL")]
    endpoint: Option<String>,

    /// Access key sent with every request
    #[arg(long, global = true, env = "STORE_ACCESS_KEY", hide_env_values = true)]
    access_key: Option<String>,

    /// Bucket used by verify-upload when --bucket is not given
    #[arg(long, global = true, env = "STORE_PHOTO_BUCKET")]
    photo_bucket: Option<String>,

    /// Print the report as JSON instead of console lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List flagged records and warn about missing or malformed image URLs
    InspectImages {
        #[command(flatten)]
        target: TargetArgs,

        /// Inspect every record, not only those with the flag set
        #[arg(long)]
        all: bool,
    },
    /// Set the flag to false on records that claim images but have none
    FixImages {
        #[command(flatten)]
        target: TargetArgs,

        /// Report what would be updated without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the contents of a table
    List {
        table: String,

        /// Comma-separated columns to select
        #[arg(long, default_value = "*")]
        columns: String,

        /// Equality filter, repeatable
        #[arg(long = "eq", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
        filters: Vec<Filter>,

        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete specific rows from a table by key
    DeleteRows {
        table: String,

        /// Column the keys are matched against
        #[arg(long, default_value = "id")]
        key_column: String,

        /// Key values, sent as text and coerced by the store
        #[arg(required = true, num_args = 1..)]
        keys: Vec<String>,
    },
    /// Upload a probe file and check it reads back intact
    VerifyUpload {
        /// Bucket to probe (defaults to the configured photo bucket)
        #[arg(long)]
        bucket: Option<String>,

        /// Object prefix for the probe
        #[arg(long, default_value = DEFAULT_PROBE_PREFIX)]
        prefix: String,

        /// Leave the probe object in the bucket
        #[arg(long)]
        keep: bool,
    },
    /// List available commands
    Commands,
}

/// Table and column overrides for the image reconciliation commands
#[derive(clap::Args, Debug)]
struct TargetArgs {
    #[arg(long)]
    table: Option<String>,
    #[arg(long)]
    id_column: Option<String>,
    #[arg(long)]
    flag_column: Option<String>,
    #[arg(long)]
    items_column: Option<String>,
}

impl From<TargetArgs> for ReconcileTarget {
    fn from(args: TargetArgs) -> Self {
        let defaults = ReconcileTarget::default();
        ReconcileTarget {
            table: args.table.unwrap_or(defaults.table),
            id_column: args.id_column.unwrap_or(defaults.id_column),
            flag_column: args.flag_column.unwrap_or(defaults.flag_column),
            items_column: args.items_column.unwrap_or(defaults.items_column),
            accepted_schemes: defaults.accepted_schemes,
        }
    }
}

fn parse_filter(raw: &str) -> Result<Filter, String> {
    store_maint::store::parse_eq_arg(raw).ok_or_else(|| format!("expected COLUMN=VALUE, got '{raw}'"))
}

fn build_command(command: Command) -> Option<Box<dyn MaintenanceCommand>> {
    let command: Box<dyn MaintenanceCommand> = match command {
        Command::InspectImages { target, all } => Box::new(InspectImages {
            target: target.into(),
            all,
        }),
        Command::FixImages { target, dry_run } => Box::new(FixImages {
            target: target.into(),
            dry_run,
        }),
        Command::List {
            table,
            columns,
            filters,
            limit,
        } => Box::new(ListRows {
            table,
            columns,
            filters,
            limit,
        }),
        Command::DeleteRows {
            table,
            key_column,
            keys,
        } => Box::new(DeleteRows {
            table,
            key_column,
            keys: keys.into_iter().map(Value::String).collect(),
        }),
        Command::VerifyUpload {
            bucket,
            prefix,
            keep,
        } => Box::new(VerifyUpload {
            bucket,
            prefix,
            keep,
        }),
        Command::Commands => return None,
    };
    Some(command)
}

async fn load_config(cli: &Cli) -> Result<StoreConfig, ConfigError> {
    let file = match &cli.config {
        Some(path) => read_config(path).await?,
        None => RawConfig::default(),
    };
    let overrides = RawConfig {
        store_endpoint: cli.endpoint.clone(),
        access_key: cli.access_key.clone(),
        photo_bucket: cli.photo_bucket.clone(),
    };
    StoreConfig::resolve(file.merge(overrides))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize report: {e}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let cli = Cli::parse();
    let json = cli.json;

    let config = if matches!(cli.command, Command::Commands) {
        None
    } else {
        match load_config(&cli).await {
            Ok(config) => Some(config),
            Err(e) => {
                error!(error = %e, "Configuration error");
                eprintln!("Configuration error: {e}");
                return ExitCode::from(CONFIG_EXIT_CODE);
            }
        }
    };

    let (Some(config), Some(command)) = (config, build_command(cli.command)) else {
        let commands = create_registry().list();
        if json {
            print_json(&commands);
        } else {
            for info in commands {
                println!("{:<16} {}", info.name, info.description);
            }
        }
        return ExitCode::SUCCESS;
    };

    let dispatcher = Dispatcher::from_config(config);
    match dispatcher.dispatch(command.as_ref()).await {
        Ok(report) if json => print_json(&report),
        Ok(report) => print!("{report}"),
        // Failures are reported, not turned into an exit status
        Err(e) => eprintln!("Error: {e}"),
    }

    ExitCode::SUCCESS
}
