//! Bulk loading of sanitized files
//!
//! Each input field is bound to a positional user variable (`@col1`,
//! `@col2`, ...) and every destination column is assigned from its variable
//! through `NULLIF(@colN, '')`, so empty tokens written by the sanitizer land
//! as `NULL`. The statement runs in `IGNORE` mode: rows that violate a key or
//! constraint are dropped by the engine instead of aborting the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::backend::LoadBackend;
use super::columns::TableSchema;
use super::error::IngestError;

/// A positional bulk load of one sanitized file into one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStatement {
    /// Sanitized file, readable by the database server
    pub path: PathBuf,
    /// Catalog schema (database) holding the table
    pub schema: String,
    /// Destination table
    pub table: String,
    /// Destination columns in field order
    pub columns: Vec<String>,
    /// Leading lines to skip (the header)
    pub ignore_lines: usize,
}

impl LoadStatement {
    /// Build a load of `path` into the resolved table
    pub fn new(path: impl Into<PathBuf>, schema: impl Into<String>, table: &TableSchema) -> Self {
        Self {
            path: path.into(),
            schema: schema.into(),
            table: table.table.clone(),
            columns: table.columns.clone(),
            ignore_lines: 1,
        }
    }

    /// File name of the staged file, for log and error context
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Render the `LOAD DATA INFILE` statement
    pub fn to_sql(&self) -> String {
        let variables: Vec<String> = (1..=self.columns.len())
            .map(|i| format!("@col{i}"))
            .collect();

        let assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = NULLIF(@col{}, '')", quote_identifier(column), i + 1))
            .collect();

        format!(
            "LOAD DATA INFILE '{path}' IGNORE INTO TABLE {schema}.{table} \
             CHARACTER SET utf8mb4 \
             FIELDS TERMINATED BY ',' OPTIONALLY ENCLOSED BY '`' ESCAPED BY '\\\\' \
             LINES TERMINATED BY '\\n' \
             IGNORE {ignore} LINES \
             ({variables}) SET {assignments}",
            path = quote_path(&self.path),
            schema = quote_identifier(&self.schema),
            table = quote_identifier(&self.table),
            ignore = self.ignore_lines,
            variables = variables.join(", "),
            assignments = assignments.join(", "),
        )
    }
}

/// Quote an identifier with backticks, doubling embedded backticks
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Render a path as the body of a single-quoted SQL string literal
///
/// Separators are normalised to `/`, which the server accepts on every
/// platform and which avoids backslash escapes in the literal.
pub fn quote_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('\'', "''")
}

/// Issue a load through the backend, returning the rows the engine inserted
///
/// Engine errors are turned into [`IngestError::LoadFailed`] carrying the
/// file and table names.
pub async fn load_file<B: LoadBackend + ?Sized>(
    backend: &mut B,
    statement: &LoadStatement,
) -> Result<u64, IngestError> {
    tracing::debug!(
        file = %statement.file_name(),
        table = %statement.table,
        backend = backend.name(),
        "issuing bulk load"
    );

    match backend.load_file(statement).await {
        Ok(inserted) => {
            tracing::info!(
                file = %statement.file_name(),
                table = %statement.table,
                inserted,
                "bulk load committed"
            );
            Ok(inserted)
        }
        Err(e) => {
            tracing::error!(
                file = %statement.file_name(),
                table = %statement.table,
                error = %e,
                "bulk load failed"
            );
            Err(IngestError::LoadFailed {
                file: statement.file_name(),
                table: statement.table.clone(),
                message: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::memory::{MemoryBackend, MemoryTable};

    fn statement() -> LoadStatement {
        let table = TableSchema::new("Dish", vec!["id".to_string(), "name".to_string()]);
        LoadStatement::new("/var/lib/mysql-files/preprocessed_Dish.csv", "NYPLMenu", &table)
    }

    #[test]
    fn test_sql_maps_columns_positionally() {
        let sql = statement().to_sql();
        assert!(sql.starts_with(
            "LOAD DATA INFILE '/var/lib/mysql-files/preprocessed_Dish.csv' IGNORE INTO TABLE `NYPLMenu`.`Dish`"
        ));
        assert!(sql.contains("(@col1, @col2) SET `id` = NULLIF(@col1, ''), `name` = NULLIF(@col2, '')"));
        assert!(sql.contains("IGNORE 1 LINES"));
    }

    #[test]
    fn test_sql_field_conventions() {
        let sql = statement().to_sql();
        assert!(sql.contains("FIELDS TERMINATED BY ','"));
        assert!(sql.contains("OPTIONALLY ENCLOSED BY '`'"));
        assert!(sql.contains("ESCAPED BY '\\\\'"));
        assert!(sql.contains("LINES TERMINATED BY '\\n'"));
    }

    #[test]
    fn test_quote_path() {
        assert_eq!(
            quote_path(Path::new("C:\\ProgramData\\MySQL\\Uploads\\Menu.csv")),
            "C:/ProgramData/MySQL/Uploads/Menu.csv"
        );
        assert_eq!(quote_path(Path::new("/tmp/o'brien.csv")), "/tmp/o''brien.csv");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("MenuItem"), "`MenuItem`");
        assert_eq!(quote_identifier("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(statement().file_name(), "preprocessed_Dish.csv");
    }

    #[tokio::test]
    async fn test_load_failure_carries_context() {
        // staged file does not exist
        let mut backend = MemoryBackend::new()
            .with_table("NYPLMenu", MemoryTable::new("Dish", &["id", "name"]));

        let err = load_file(&mut backend, &statement()).await.unwrap_err();
        match err {
            IngestError::LoadFailed { file, table, .. } => {
                assert_eq!(file, "preprocessed_Dish.csv");
                assert_eq!(table, "Dish");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
