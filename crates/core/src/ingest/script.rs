//! Schema script execution
//!
//! The DDL script is split on `;` and run one statement at a time. A failing
//! statement is logged and counted; the rest of the script still runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::backend::LoadBackend;

/// Outcome of running a schema script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStats {
    /// Statements that succeeded
    pub executed: usize,
    /// Statements the engine rejected
    pub failed: usize,
    /// `statement: error` for each rejected statement
    pub failures: Vec<String>,
}

impl ScriptStats {
    /// Total statements attempted
    pub fn total(&self) -> usize {
        self.executed + self.failed
    }
}

/// Split a script into trimmed, non-empty statements
pub fn split_statements(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Run every statement of `script` against the backend
pub async fn run_script<B: LoadBackend + ?Sized>(backend: &mut B, script: &str) -> ScriptStats {
    let mut stats = ScriptStats::default();

    for statement in split_statements(script) {
        match backend.execute(statement).await {
            Ok(_) => stats.executed += 1,
            Err(e) => {
                tracing::error!(statement = %preview(statement), error = %e, "schema statement failed");
                stats.failed += 1;
                stats.failures.push(format!("{}: {}", preview(statement), e));
            }
        }
    }

    if let Err(e) = backend.execute("COMMIT").await {
        tracing::warn!(error = %e, "commit after schema script failed");
    }

    tracing::info!(
        executed = stats.executed,
        failed = stats.failed,
        "schema script finished"
    );
    stats
}

/// Read a script file and run it
///
/// Only reading the file can fail; statement failures land in the stats.
pub async fn run_schema_script<B: LoadBackend + ?Sized>(
    backend: &mut B,
    path: &Path,
) -> std::io::Result<ScriptStats> {
    let script = std::fs::read_to_string(path)?;
    tracing::info!(script = %path.display(), "running schema script");
    Ok(run_script(backend, &script).await)
}

fn preview(statement: &str) -> String {
    let first_line = statement.lines().next().unwrap_or_default();
    if first_line.chars().count() > 80 || statement.contains('\n') {
        format!("{}...", first_line.chars().take(80).collect::<String>())
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::memory::MemoryBackend;

    #[test]
    fn test_split_statements() {
        let script = "DROP DATABASE IF EXISTS NYPLMenu;\n\nCREATE DATABASE NYPLMenu;\n  ;USE NYPLMenu";
        assert_eq!(
            split_statements(script),
            vec![
                "DROP DATABASE IF EXISTS NYPLMenu",
                "CREATE DATABASE NYPLMenu",
                "USE NYPLMenu"
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_statement_does_not_stop_script() {
        let mut backend = MemoryBackend::new().fail_statements_containing("BROKEN");
        let stats = run_script(
            &mut backend,
            "CREATE DATABASE NYPLMenu; CREATE TABLE BROKEN (; CREATE TABLE Dish (id INT);",
        )
        .await;

        assert_eq!(stats.executed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total(), 3);
        assert!(stats.failures[0].contains("BROKEN"));
        // statements plus the trailing commit
        assert_eq!(backend.executed().len(), 4);
        assert_eq!(backend.executed()[2], "CREATE TABLE Dish (id INT)");
    }

    #[tokio::test]
    async fn test_missing_script_file() {
        let mut backend = MemoryBackend::new();
        let result = run_schema_script(&mut backend, Path::new("/nonexistent/schema.sql")).await;
        assert!(result.is_err());
    }
}
