//! Destination column resolution

use serde::{Deserialize, Serialize};

use super::backend::LoadBackend;
use super::error::IngestError;

/// Ordered column list of a destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub table: String,
    /// Column names in declared order
    pub columns: Vec<String>,
}

impl TableSchema {
    /// Create a schema from a table name and its ordered columns
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check a CSV header against the column order
    ///
    /// Fields map to columns by position, so a reordered or extra CSV column
    /// would otherwise load silently into the wrong place.
    pub fn check_header(
        &self,
        file: &str,
        header: &[String],
        check: HeaderCheck,
    ) -> Result<(), IngestError> {
        let mismatch = |reason: String| IngestError::ColumnMismatch {
            file: file.to_string(),
            table: self.table.clone(),
            reason,
        };

        match check {
            HeaderCheck::Off => Ok(()),
            HeaderCheck::Count | HeaderCheck::Strict if header.len() != self.len() => {
                Err(mismatch(format!(
                    "{} header fields for {} columns",
                    header.len(),
                    self.len()
                )))
            }
            HeaderCheck::Count => Ok(()),
            HeaderCheck::Strict => {
                let misplaced: Vec<String> = header
                    .iter()
                    .zip(&self.columns)
                    .enumerate()
                    .filter(|(_, (field, column))| !field.trim().eq_ignore_ascii_case(column))
                    .map(|(i, (field, column))| {
                        format!("position {}: '{}' vs '{}'", i + 1, field.trim(), column)
                    })
                    .collect();

                if misplaced.is_empty() {
                    Ok(())
                } else {
                    Err(mismatch(misplaced.join(", ")))
                }
            }
        }
    }
}

/// Header-to-schema alignment policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderCheck {
    /// Load positionally without looking at the header
    Off,
    /// Header field count must equal the column count
    Count,
    /// Header names must match the column names in order (case-insensitive)
    #[default]
    Strict,
}

impl std::str::FromStr for HeaderCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(HeaderCheck::Off),
            "count" => Ok(HeaderCheck::Count),
            "strict" => Ok(HeaderCheck::Strict),
            _ => Err(format!(
                "Invalid header check: {}. Expected: off, count, strict",
                s
            )),
        }
    }
}

/// Resolve the ordered column list of `schema.table` from the catalog
pub async fn resolve_columns<B: LoadBackend + ?Sized>(
    backend: &mut B,
    schema: &str,
    table: &str,
) -> Result<TableSchema, IngestError> {
    let columns = backend
        .table_columns(schema, table)
        .await
        .map_err(|e| IngestError::backend(table, e))?;

    if columns.is_empty() {
        return Err(IngestError::SchemaNotFound {
            schema: schema.to_string(),
            table: table.to_string(),
        });
    }

    tracing::debug!(table = %table, columns = columns.len(), "resolved columns");
    Ok(TableSchema::new(table, columns))
}
