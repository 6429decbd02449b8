//! The `load` command

use std::path::PathBuf;

use menuload_core::ingest::MySqlBackend;
use menuload_core::{
    DbCredentials, HeaderCheck, PipelineConfig, PipelineError, PipelineExecutor, RowCountMode,
    TableSource,
};

use crate::error::CliError;
use crate::output::{OutputFormat, print_report};

/// Arguments for the `load` command
pub struct LoadArgs {
    /// Credentials file (JSON or TOML)
    pub config: PathBuf,
    /// Directory holding the source CSVs
    pub source: PathBuf,
    /// DDL script to run first
    pub schema: Option<PathBuf>,
    /// Catalog schema
    pub database: String,
    /// Comma-separated files in load order
    pub tables: Option<String>,
    /// Use `COUNT(*)` instead of catalog statistics
    pub exact_counts: bool,
    /// Header alignment policy
    pub header_check: HeaderCheck,
    /// Leave copied sources in the ingestion directory
    pub keep_sources: bool,
    /// Output format
    pub format: OutputFormat,
    /// Draw progress bars
    pub progress: bool,
}

impl LoadArgs {
    /// Build the pipeline configuration
    pub fn to_config(&self) -> Result<PipelineConfig, CliError> {
        let mut config = PipelineConfig::new()
            .with_source(&self.source)
            .with_database(&self.database)
            .with_header_check(self.header_check)
            .with_cleanup_sources(!self.keep_sources)
            .with_progress(self.progress)
            .with_row_count_mode(if self.exact_counts {
                RowCountMode::Exact
            } else {
                RowCountMode::Estimated
            });

        if let Some(list) = &self.tables {
            let tables = TableSource::parse_list(list);
            if tables.is_empty() {
                return Err(CliError::InvalidArgument(format!(
                    "--tables '{list}' names no files"
                )));
            }
            config = config.with_tables(tables);
        }

        if let Some(schema) = &self.schema {
            config = config.with_schema_script(schema);
        }

        config.validate().map_err(PipelineError::Config)?;
        Ok(config)
    }
}

/// Handle the `load` command
pub async fn handle_load(args: &LoadArgs) -> Result<(), CliError> {
    let config = args.to_config()?;
    let credentials = DbCredentials::load(&args.config)?;

    let backend = MySqlBackend::connect(&credentials)
        .await
        .map_err(PipelineError::Connection)?;

    let mut executor = PipelineExecutor::new(config, backend)?;
    tracing::info!(run_id = %executor.run_id(), "Starting load");

    let report = executor.run().await?;
    print_report(&report, args.format)?;

    if let Err(e) = executor.into_backend().disconnect().await {
        tracing::warn!(error = %e, "Disconnect failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> LoadArgs {
        LoadArgs {
            config: PathBuf::from("db_config.json"),
            source: PathBuf::from("../NYPL-menus"),
            schema: None,
            database: "NYPLMenu".to_string(),
            tables: None,
            exact_counts: false,
            header_check: HeaderCheck::Strict,
            keep_sources: false,
            format: OutputFormat::Text,
            progress: false,
        }
    }

    #[test]
    fn test_to_config_defaults() {
        let config = args().to_config().unwrap();
        assert_eq!(config.tables.len(), 4);
        assert_eq!(config.row_count_mode, RowCountMode::Estimated);
        assert!(config.cleanup_sources);
    }

    #[test]
    fn test_to_config_overrides() {
        let mut args = args();
        args.tables = Some("Dish.csv".to_string());
        args.exact_counts = true;
        args.keep_sources = true;

        let config = args.to_config().unwrap();
        assert_eq!(config.tables, vec![TableSource::from_file_name("Dish.csv")]);
        assert_eq!(config.row_count_mode, RowCountMode::Exact);
        assert!(!config.cleanup_sources);
    }

    #[test]
    fn test_empty_table_list_is_rejected() {
        let mut args = args();
        args.tables = Some(" , ".to_string());
        assert!(matches!(
            args.to_config(),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
