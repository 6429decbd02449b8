//! Relational engine abstraction used by the ingestion pipeline

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::BackendError;
use super::loader::LoadStatement;

/// How the verifier obtains the post-load row count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowCountMode {
    /// Catalog statistics (`information_schema.tables.table_rows`).
    ///
    /// Cheap, but only an estimate for engines such as InnoDB and may lag
    /// behind a load that just committed.
    #[default]
    Estimated,
    /// `SELECT COUNT(*)` against the table
    Exact,
}

impl std::fmt::Display for RowCountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowCountMode::Estimated => write!(f, "estimated"),
            RowCountMode::Exact => write!(f, "exact"),
        }
    }
}

impl std::str::FromStr for RowCountMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "estimated" | "estimate" => Ok(RowCountMode::Estimated),
            "exact" => Ok(RowCountMode::Exact),
            _ => Err(format!(
                "Invalid row count mode: {}. Expected: estimated, exact",
                s
            )),
        }
    }
}

/// A database engine that can receive bulk loads
///
/// The pipeline drives a single backend serially; implementations may keep
/// one connection and need not be shareable.
#[async_trait]
pub trait LoadBackend: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Directory the engine is allowed to bulk-load from, if configured
    async fn secure_file_dir(&mut self) -> Result<Option<PathBuf>, BackendError>;

    /// Execute a statement that returns no rows
    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError>;

    /// Column names of `schema.table` in declared order; empty if unknown
    async fn table_columns(&mut self, schema: &str, table: &str)
    -> Result<Vec<String>, BackendError>;

    /// Run a bulk load as one transaction, returning the rows the engine inserted
    async fn load_file(&mut self, statement: &LoadStatement) -> Result<u64, BackendError>;

    /// Row count of `schema.table`, `None` if the catalog does not know the table
    async fn row_count(
        &mut self,
        schema: &str,
        table: &str,
        mode: RowCountMode,
    ) -> Result<Option<u64>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_mode_from_str() {
        assert_eq!(
            "exact".parse::<RowCountMode>().unwrap(),
            RowCountMode::Exact
        );
        assert_eq!(
            "Estimated".parse::<RowCountMode>().unwrap(),
            RowCountMode::Estimated
        );
        assert!("approximate".parse::<RowCountMode>().is_err());
    }

    #[test]
    fn test_row_count_mode_default() {
        assert_eq!(RowCountMode::default(), RowCountMode::Estimated);
        assert_eq!(RowCountMode::Exact.to_string(), "exact");
    }
}
