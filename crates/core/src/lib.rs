//! Menu CSV loading core
//!
//! Sanitizes museum-menu CSV exports and bulk-loads them into a relational
//! engine, reconciling the row counts after each load:
//! - [`ingest`]: per-file building blocks and the engine abstraction
//! - [`pipeline`]: configuration, the run executor and its reports

pub mod ingest;
pub mod pipeline;

pub use ingest::{
    BackendError, HeaderCheck, IngestError, LoadBackend, LoadResult, MemoryBackend, MemoryTable,
    RowCountMode, TableSchema,
};
#[cfg(feature = "mysql-backend")]
pub use ingest::MySqlBackend;
pub use pipeline::{
    DbCredentials, FileReport, FileState, PipelineConfig, PipelineError, PipelineExecutor,
    RunReport, TableSource, run_pipeline,
};
