//! In-memory load backend
//!
//! Reads staged files the way the server would (positional variables,
//! `NULLIF` coercion, `IGNORE` mode) and keeps rows in plain vectors. Tables
//! can carry a primary key, foreign keys and per-column checks so constraint
//! drops can be reproduced without a server.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;

use super::backend::{LoadBackend, RowCountMode};
use super::error::BackendError;
use super::loader::LoadStatement;
use super::sanitize::split_sanitized_line;

/// A stored row, one value per table column
pub type Row = Vec<Option<String>>;

type Check = Box<dyn Fn(Option<&str>) -> bool + Send>;

struct ForeignKey {
    column: usize,
    parent: String,
    parent_column: String,
}

/// A table held by [`MemoryBackend`]
pub struct MemoryTable {
    name: String,
    columns: Vec<String>,
    primary_key: Option<usize>,
    foreign_keys: Vec<ForeignKey>,
    checks: Vec<(usize, Check)>,
    rows: Vec<Row>,
}

impl MemoryTable {
    /// Create a table whose first column is its primary key
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            primary_key: if columns.is_empty() { None } else { Some(0) },
            foreign_keys: Vec::new(),
            checks: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Require non-NULL values of `column` to exist in `parent.parent_column`
    pub fn with_foreign_key(mut self, column: &str, parent: &str, parent_column: &str) -> Self {
        if let Some(index) = self.index_of(column) {
            self.foreign_keys.push(ForeignKey {
                column: index,
                parent: parent.to_string(),
                parent_column: parent_column.to_string(),
            });
        }
        self
    }

    /// Reject rows whose `column` value fails `check`
    pub fn with_check<F>(mut self, column: &str, check: F) -> Self
    where
        F: Fn(Option<&str>) -> bool + Send + 'static,
    {
        if let Some(index) = self.index_of(column) {
            self.checks.push((index, Box::new(check)));
        }
        self
    }

    /// Pre-populate with `count` rows of NULLs
    pub fn with_rows(mut self, count: usize) -> Self {
        let width = self.columns.len();
        self.rows.extend((0..count).map(|_| vec![None; width]));
        self
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Values stored in `column`
    pub fn column_values(&self, column: &str) -> Vec<Option<String>> {
        match self.index_of(column) {
            Some(index) => self.rows.iter().map(|r| r[index].clone()).collect(),
            None => Vec::new(),
        }
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    fn contains(&self, column: &str, value: &str) -> bool {
        self.index_of(column).is_some_and(|index| {
            self.rows
                .iter()
                .any(|r| r[index].as_deref() == Some(value))
        })
    }
}

/// A [`LoadBackend`] that keeps everything in memory
#[derive(Default)]
pub struct MemoryBackend {
    secure_dir: Option<PathBuf>,
    tables: BTreeMap<(String, String), MemoryTable>,
    executed: Vec<String>,
    loads: Vec<LoadStatement>,
    failing: Vec<String>,
}

impl MemoryBackend {
    /// Create an empty backend with no secure directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory reported as `secure_file_priv`
    pub fn with_secure_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.secure_dir = Some(dir.into());
        self
    }

    /// Register a table under `schema`
    pub fn with_table(mut self, schema: &str, table: MemoryTable) -> Self {
        self.tables.insert(key(schema, &table.name), table);
        self
    }

    /// Make every executed statement or load whose SQL contains `fragment` fail
    pub fn fail_statements_containing(mut self, fragment: &str) -> Self {
        self.failing.push(fragment.to_string());
        self
    }

    /// Look up a table
    pub fn table(&self, schema: &str, table: &str) -> Option<&MemoryTable> {
        self.tables.get(&key(schema, table))
    }

    /// Statements passed to [`LoadBackend::execute`], in order
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Loads issued, in order
    pub fn loads(&self) -> &[LoadStatement] {
        &self.loads
    }

    fn parse_rows(&self, statement: &LoadStatement) -> Result<Vec<Vec<Option<String>>>, BackendError> {
        let content = std::fs::read_to_string(&statement.path).map_err(|e| {
            BackendError::Query(format!(
                "File '{}' not found ({})",
                statement.path.display(),
                e
            ))
        })?;

        Ok(content
            .lines()
            .skip(statement.ignore_lines)
            .map(split_sanitized_line)
            .collect())
    }

    fn accepts(&self, schema: &str, table: &MemoryTable, row: &Row, keys: &HashSet<String>) -> bool {
        if let Some(pk) = table.primary_key {
            match &row[pk] {
                Some(value) if keys.contains(value) => return false,
                None => return false,
                _ => {}
            }
        }

        for fk in &table.foreign_keys {
            if let Some(value) = &row[fk.column] {
                let parent_has = self
                    .tables
                    .get(&key(schema, &fk.parent))
                    .is_some_and(|p| p.contains(&fk.parent_column, value));
                if !parent_has {
                    return false;
                }
            }
        }

        table
            .checks
            .iter()
            .all(|(index, check)| check(row[*index].as_deref()))
    }
}

fn key(schema: &str, table: &str) -> (String, String) {
    (schema.to_lowercase(), table.to_lowercase())
}

#[async_trait]
impl LoadBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn secure_file_dir(&mut self) -> Result<Option<PathBuf>, BackendError> {
        Ok(self.secure_dir.clone())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError> {
        self.executed.push(sql.to_string());
        if let Some(fragment) = self.failing.iter().find(|f| sql.contains(f.as_str())) {
            return Err(BackendError::Query(format!(
                "statement rejected near '{fragment}'"
            )));
        }
        Ok(0)
    }

    async fn table_columns(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>, BackendError> {
        Ok(self
            .table(schema, table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn load_file(&mut self, statement: &LoadStatement) -> Result<u64, BackendError> {
        self.loads.push(statement.clone());

        let sql = statement.to_sql();
        if let Some(fragment) = self.failing.iter().find(|f| sql.contains(f.as_str())) {
            return Err(BackendError::Query(format!(
                "statement rejected near '{fragment}'"
            )));
        }

        let table_key = key(&statement.schema, &statement.table);
        let Some(table) = self.tables.get(&table_key) else {
            return Err(BackendError::Query(format!(
                "Table '{}.{}' doesn't exist",
                statement.schema, statement.table
            )));
        };

        // target column index for each input field
        let targets: Vec<Option<usize>> = statement
            .columns
            .iter()
            .map(|c| table.index_of(c))
            .collect();

        let mut keys: HashSet<String> = match table.primary_key {
            Some(pk) => table.rows.iter().filter_map(|r| r[pk].clone()).collect(),
            None => HashSet::new(),
        };

        let mut accepted = Vec::new();
        for fields in self.parse_rows(statement)? {
            let mut row = vec![None; table.columns.len()];
            for (value, target) in fields.into_iter().zip(&targets) {
                if let Some(index) = target {
                    row[*index] = value;
                }
            }

            if self.accepts(&statement.schema, table, &row, &keys) {
                if let Some(pk) = table.primary_key {
                    if let Some(value) = &row[pk] {
                        keys.insert(value.clone());
                    }
                }
                accepted.push(row);
            }
        }

        let inserted = accepted.len() as u64;
        if let Some(table) = self.tables.get_mut(&table_key) {
            table.rows.extend(accepted);
        }
        Ok(inserted)
    }

    async fn row_count(
        &mut self,
        schema: &str,
        table: &str,
        _mode: RowCountMode,
    ) -> Result<Option<u64>, BackendError> {
        Ok(self.table(schema, table).map(|t| t.rows.len() as u64))
    }
}
