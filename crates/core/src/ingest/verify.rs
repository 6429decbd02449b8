//! Row-count reconciliation after a bulk load
//!
//! The engine drops rows that violate constraints without reporting them
//! individually, so the only observable signal is the difference between the
//! rows in the staged file and the rows in the table afterwards. A nonzero
//! difference is normal and is reported, not raised.
//!
//! With [`RowCountMode::Estimated`] the actual count comes from catalog
//! statistics. For InnoDB these are approximate and may not yet reflect the
//! load that just committed, so `skipped_rows` can be off in either
//! direction. Use [`RowCountMode::Exact`] when the figure has to be exact.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::backend::{LoadBackend, RowCountMode};
use super::error::IngestError;

/// Outcome of reconciling one load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    /// Data lines in the staged file
    pub expected_rows: u64,
    /// Rows the catalog reports for the table
    pub actual_rows: u64,
    /// `expected - actual`; negative when the table already held rows
    pub skipped_rows: i64,
    /// `100 * actual / expected`, 0 when nothing was expected
    pub loaded_percentage: f64,
    /// `100 * skipped / expected`, 0 when nothing was expected
    pub skipped_percentage: f64,
    /// How `actual_rows` was obtained
    pub count_mode: RowCountMode,
}

impl LoadResult {
    /// Reconcile expected against actual rows
    pub fn new(expected_rows: u64, actual_rows: u64, count_mode: RowCountMode) -> Self {
        let skipped_rows = expected_rows as i64 - actual_rows as i64;
        let (loaded_percentage, skipped_percentage) = if expected_rows == 0 {
            (0.0, 0.0)
        } else {
            let expected = expected_rows as f64;
            (
                100.0 * actual_rows as f64 / expected,
                100.0 * skipped_rows as f64 / expected,
            )
        };

        Self {
            expected_rows,
            actual_rows,
            skipped_rows,
            loaded_percentage,
            skipped_percentage,
            count_mode,
        }
    }

    /// Whether every expected row is accounted for
    pub fn is_complete(&self) -> bool {
        self.skipped_rows <= 0
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "expected {}, loaded {} ({:.2}%), skipped {} ({:.2}%){}",
            self.expected_rows,
            self.actual_rows,
            self.loaded_percentage,
            self.skipped_rows,
            self.skipped_percentage,
            match self.count_mode {
                RowCountMode::Estimated => " [estimated]",
                RowCountMode::Exact => "",
            }
        )
    }
}

/// Count data lines in a sanitized file (all lines minus the header)
pub fn count_data_lines(path: &Path) -> Result<u64, IngestError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = 0u64;
    for line in reader.split(b'\n') {
        line?;
        lines += 1;
    }
    Ok(lines.saturating_sub(1))
}

/// Reconcile the staged file at `path` against `schema.table`
pub async fn verify<B: LoadBackend + ?Sized>(
    backend: &mut B,
    path: &Path,
    schema: &str,
    table: &str,
    mode: RowCountMode,
) -> Result<LoadResult, IngestError> {
    let expected = count_data_lines(path)?;
    let actual = backend
        .row_count(schema, table, mode)
        .await
        .map_err(|e| IngestError::backend(table, e))?
        .ok_or_else(|| IngestError::RowCountUnavailable {
            schema: schema.to_string(),
            table: table.to_string(),
        })?;

    let result = LoadResult::new(expected, actual, mode);
    if !result.is_complete() {
        tracing::warn!(
            table = %table,
            expected = result.expected_rows,
            actual = result.actual_rows,
            skipped = result.skipped_rows,
            "rows skipped during load"
        );
    } else {
        tracing::info!(
            table = %table,
            expected = result.expected_rows,
            actual = result.actual_rows,
            "load verified"
        );
    }
    Ok(result)
}
