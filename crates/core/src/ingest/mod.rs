//! CSV ingestion into a relational engine
//!
//! The pieces a single file goes through, leaf first:
//!
//! - [`sanitize`]: rewrite every field into a load-safe token
//! - [`columns`]: resolve the destination column order from the catalog
//! - [`loader`]: issue the positional bulk load
//! - [`verify`]: reconcile expected and actual row counts
//!
//! The engine itself sits behind [`LoadBackend`]. [`MemoryBackend`] keeps
//! tables in memory; `MySqlBackend` (feature `mysql-backend`) talks to a
//! server.

pub mod backend;
pub mod columns;
pub mod error;
pub mod files;
pub mod loader;
pub mod memory;
#[cfg(feature = "mysql-backend")]
pub mod mysql;
pub mod progress;
pub mod sanitize;
pub mod script;
pub mod verify;

pub use backend::{LoadBackend, RowCountMode};
pub use columns::{HeaderCheck, TableSchema, resolve_columns};
pub use error::{BackendError, IngestError};
pub use files::{StagedFile, cleanup_files, copy_csvs, staged_path};
pub use loader::{LoadStatement, load_file};
pub use memory::{MemoryBackend, MemoryTable};
#[cfg(feature = "mysql-backend")]
pub use mysql::MySqlBackend;
pub use progress::{LoadProgress, format_number, format_signed};
pub use sanitize::{SanitizeStats, decode_field, sanitize_field, sanitize_file, sanitize_record};
pub use script::{ScriptStats, run_schema_script, run_script};
pub use verify::{LoadResult, count_data_lines, verify};
