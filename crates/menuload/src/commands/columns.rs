//! The `columns` command

use std::path::PathBuf;

use menuload_core::ingest::{MySqlBackend, resolve_columns};
use menuload_core::{DbCredentials, PipelineError};

use crate::error::CliError;

/// Arguments for the `columns` command
pub struct ColumnsArgs {
    /// Credentials file (JSON or TOML)
    pub config: PathBuf,
    /// Catalog schema
    pub database: String,
    /// Table to describe
    pub table: String,
}

/// Handle the `columns` command
pub async fn handle_columns(args: &ColumnsArgs) -> Result<(), CliError> {
    let credentials = DbCredentials::load(&args.config)?;
    let mut backend = MySqlBackend::connect(&credentials)
        .await
        .map_err(PipelineError::Connection)?;

    let schema = resolve_columns(&mut backend, &args.database, &args.table).await?;
    println!("{}.{} ({} columns)", args.database, schema.table, schema.len());
    for (i, column) in schema.columns.iter().enumerate() {
        println!("  {:>3}  {}", i + 1, column);
    }

    if let Err(e) = backend.disconnect().await {
        tracing::warn!(error = %e, "Disconnect failed");
    }
    Ok(())
}
