//! Pipeline configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use crate::ingest::{HeaderCheck, RowCountMode};

/// Catalog schema the default schema script creates
pub const DEFAULT_DATABASE: &str = "NYPLMenu";

/// Source files in foreign-key order, parents first
pub const DEFAULT_FILES: [&str; 4] = ["Menu.csv", "Dish.csv", "MenuPage.csv", "MenuItem.csv"];

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the source CSVs
    pub source_dir: Option<PathBuf>,
    /// DDL script run before loading (optional)
    pub schema_script: Option<PathBuf>,
    /// Catalog schema (database) the tables live in
    pub database: String,
    /// Files to load, in load order
    pub tables: Vec<TableSource>,
    /// How post-load row counts are obtained
    pub row_count_mode: RowCountMode,
    /// Header-to-column alignment policy
    pub header_check: HeaderCheck,
    /// Copy the sources into the ingestion directory before loading
    pub copy_sources: bool,
    /// Delete the copies once the run finishes
    pub cleanup_sources: bool,
    /// Draw progress bars
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            schema_script: None,
            database: DEFAULT_DATABASE.to_string(),
            tables: TableSource::default_tables(),
            row_count_mode: RowCountMode::default(),
            header_check: HeaderCheck::default(),
            copy_sources: true,
            cleanup_sources: true,
            show_progress: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source directory
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(path.into());
        self
    }

    /// Set the schema script
    pub fn with_schema_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_script = Some(path.into());
        self
    }

    /// Set the catalog schema
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the files to load, in order
    pub fn with_tables(mut self, tables: Vec<TableSource>) -> Self {
        self.tables = tables;
        self
    }

    /// Set the row count mode
    pub fn with_row_count_mode(mut self, mode: RowCountMode) -> Self {
        self.row_count_mode = mode;
        self
    }

    /// Set the header check policy
    pub fn with_header_check(mut self, check: HeaderCheck) -> Self {
        self.header_check = check;
        self
    }

    /// Enable or disable copying sources into the ingestion directory
    pub fn with_copy_sources(mut self, copy: bool) -> Self {
        self.copy_sources = copy;
        self
    }

    /// Enable or disable deleting copied sources after the run
    pub fn with_cleanup_sources(mut self, cleanup: bool) -> Self {
        self.cleanup_sources = cleanup;
        self
    }

    /// Enable progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.source_dir.is_none() {
            return Err("Source directory is required".to_string());
        }

        if self.database.trim().is_empty() {
            return Err("Database name must not be empty".to_string());
        }

        if self.tables.is_empty() {
            return Err("At least one table file is required".to_string());
        }

        for source in &self.tables {
            if source.table.is_empty() {
                return Err(format!("Cannot derive a table name from '{}'", source.file));
            }
        }

        Ok(())
    }
}

/// A source file and the table it loads into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSource {
    /// File name inside the source directory
    pub file: String,
    /// Destination table
    pub table: String,
}

impl TableSource {
    /// Derive the table from the file stem (`MenuItem.csv` loads `MenuItem`)
    pub fn from_file_name(file: impl Into<String>) -> Self {
        let file = file.into();
        let table = Path::new(&file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { file, table }
    }

    /// The four menu files in foreign-key order
    pub fn default_tables() -> Vec<Self> {
        DEFAULT_FILES.iter().map(|f| Self::from_file_name(*f)).collect()
    }

    /// Parse a comma-separated list of file names
    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(Self::from_file_name)
            .collect()
    }
}

impl std::fmt::Display for TableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.file, self.table)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

/// Database credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct DbCredentials {
    /// User name
    pub user: String,
    /// Password
    pub password: String,
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl DbCredentials {
    /// Load credentials from a `.json` or `.toml` file
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::io_with_path(path, "reading credentials", e))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }
}

impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
