//! menuload - load museum menu CSV exports into MySQL

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use menuload_core::HeaderCheck;
use menuload_core::pipeline::DEFAULT_DATABASE;
use tracing_subscriber::EnvFilter;

use commands::columns::{ColumnsArgs, handle_columns};
use commands::load::{LoadArgs, handle_load};
use commands::sanitize::{SanitizeArgs, handle_sanitize};
use error::CliError;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "menuload", version, about = "Load museum menu CSV exports into MySQL")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sanitize, bulk-load and verify every configured CSV
    Load {
        /// Credentials file (JSON or TOML)
        #[arg(long, default_value = "db_config.json")]
        config: PathBuf,
        /// Directory holding the source CSVs
        #[arg(long)]
        source: PathBuf,
        /// DDL script to run before loading
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Catalog schema the tables live in
        #[arg(long, default_value = DEFAULT_DATABASE)]
        database: String,
        /// Comma-separated files in load order (parents first)
        #[arg(long, value_name = "FILES")]
        tables: Option<String>,
        /// Count rows with COUNT(*) instead of catalog statistics
        #[arg(long)]
        exact_counts: bool,
        /// Header alignment check: off, count or strict
        #[arg(long, default_value = "strict")]
        header_check: HeaderCheck,
        /// Keep copied CSVs in the ingestion directory
        #[arg(long)]
        keep_sources: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Disable progress bars
        #[arg(long)]
        no_progress: bool,
    },
    /// Sanitize a single CSV without touching the database
    Sanitize {
        /// Source CSV
        input: PathBuf,
        /// Load-ready output file
        output: PathBuf,
    },
    /// Print the column order of a table
    Columns {
        /// Credentials file (JSON or TOML)
        #[arg(long, default_value = "db_config.json")]
        config: PathBuf,
        /// Table name
        #[arg(long)]
        table: String,
        /// Catalog schema
        #[arg(long, default_value = DEFAULT_DATABASE)]
        database: String,
    },
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Load {
            config,
            source,
            schema,
            database,
            tables,
            exact_counts,
            header_check,
            keep_sources,
            format,
            no_progress,
        } => {
            let args = LoadArgs {
                config,
                source,
                schema,
                database,
                tables,
                exact_counts,
                header_check,
                keep_sources,
                format,
                progress: !no_progress && format == OutputFormat::Text,
            };
            handle_load(&args).await
        }
        Commands::Sanitize { input, output } => handle_sanitize(&SanitizeArgs { input, output }),
        Commands::Columns {
            config,
            table,
            database,
        } => {
            handle_columns(&ColumnsArgs {
                config,
                database,
                table,
            })
            .await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match run(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}
