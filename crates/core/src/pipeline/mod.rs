//! Run orchestration for loading a directory of menu CSVs
//!
//! A run goes through these steps, each fatal on failure:
//!
//! 1. Validate the configuration
//! 2. Ask the backend for its secure ingestion directory
//! 3. Check the source directory and copy its CSVs into the ingestion directory
//! 4. Run the schema script, if any (individual statement failures are logged)
//!
//! Then each configured file is processed in order, parents before children
//! so foreign keys resolve. A file that fails is recorded and the run moves
//! on; the run itself always ends as "completed with N files processed,
//! M skipped".
//!
//! # Example
//!
//! ```rust,ignore
//! use menuload_core::ingest::MySqlBackend;
//! use menuload_core::pipeline::{DbCredentials, PipelineConfig, PipelineExecutor};
//!
//! let credentials = DbCredentials::load(Path::new("db_config.json"))?;
//! let backend = MySqlBackend::connect(&credentials).await?;
//!
//! let config = PipelineConfig::new()
//!     .with_source("../NYPL-menus")
//!     .with_schema_script("regenerate-database.sql");
//!
//! let mut executor = PipelineExecutor::new(config, backend)?;
//! let report = executor.run().await?;
//!
//! println!("{}", report.summary_line());
//! ```

mod config;
mod error;
mod executor;
mod report;

pub use config::{DEFAULT_DATABASE, DEFAULT_FILES, DbCredentials, PipelineConfig, TableSource};
pub use error::{PipelineError, PipelineResult};
pub use executor::PipelineExecutor;
pub use report::{FileReport, FileState, RunReport};

use crate::ingest::LoadBackend;

/// Run a pipeline with the given configuration and backend
///
/// This is a convenience function for simple pipeline execution.
pub async fn run_pipeline<B: LoadBackend>(
    config: PipelineConfig,
    backend: B,
) -> PipelineResult<RunReport> {
    let mut executor = PipelineExecutor::new(config, backend)?;
    executor.run().await
}
