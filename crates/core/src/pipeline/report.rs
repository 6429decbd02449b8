//! Per-file states and run reports

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::{LoadResult, ScriptStats};

/// Where a file is in its processing
///
/// ```text
/// PENDING -> SANITIZING -> LOADING -> VERIFIED
///                  |           '----> LOAD_FAILED
///                  '----------------> LOAD_FAILED
/// PENDING -> RESOLVE_FAILED
/// PENDING -> SOURCE_MISSING
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Pending,
    Sanitizing,
    Loading,
    Verified,
    LoadFailed,
    ResolveFailed,
    SourceMissing,
}

impl FileState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Verified | Self::LoadFailed | Self::ResolveFailed | Self::SourceMissing
        )
    }

    /// Whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: FileState) -> bool {
        use FileState::*;
        matches!(
            (self, next),
            (Pending, Sanitizing)
                | (Pending, ResolveFailed)
                | (Pending, SourceMissing)
                | (Sanitizing, Loading)
                | (Sanitizing, LoadFailed)
                | (Loading, Verified)
                | (Loading, LoadFailed)
        )
    }

    /// Upper-case name used in logs and text output
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sanitizing => "SANITIZING",
            Self::Loading => "LOADING",
            Self::Verified => "VERIFIED",
            Self::LoadFailed => "LOAD_FAILED",
            Self::ResolveFailed => "RESOLVE_FAILED",
            Self::SourceMissing => "SOURCE_MISSING",
        }
    }
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of one source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Source file name
    pub file: String,
    /// Destination table
    pub table: String,
    /// Current state
    pub state: FileState,
    /// Rows the engine reported inserting
    pub inserted_rows: Option<u64>,
    /// Row-count reconciliation, once verified
    pub result: Option<LoadResult>,
    /// Error that ended processing
    pub error: Option<String>,
    /// Non-fatal problems, such as a staged file that could not be deleted
    pub warnings: Vec<String>,
    /// Time spent on this file
    pub duration_ms: u64,
}

impl FileReport {
    /// Create a pending report
    pub fn new(file: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            table: table.into(),
            state: FileState::Pending,
            inserted_rows: None,
            result: None,
            error: None,
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Move to `next`, ignoring illegal transitions
    pub fn advance(&mut self, next: FileState) -> bool {
        if self.state.can_transition_to(next) {
            tracing::debug!(file = %self.file, from = %self.state, to = %next, "file state");
            self.state = next;
            true
        } else {
            tracing::warn!(file = %self.file, from = %self.state, to = %next, "illegal file state transition");
            false
        }
    }

    /// Move to a failure state, recording the error
    pub fn fail(&mut self, state: FileState, error: impl Into<String>) {
        self.advance(state);
        self.error = Some(error.into());
    }

    /// Whether the file was loaded and verified
    pub fn is_processed(&self) -> bool {
        self.state == FileState::Verified
    }
}

/// Report from a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run ID
    pub run_id: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// Directory the engine loaded from
    pub ingest_dir: PathBuf,
    /// Schema script outcome, if one was run
    pub schema: Option<ScriptStats>,
    /// One report per configured file, in load order
    pub files: Vec<FileReport>,
    /// Run-level warnings, such as copies that could not be deleted
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Files loaded and verified
    pub fn files_processed(&self) -> usize {
        self.files.iter().filter(|f| f.is_processed()).count()
    }

    /// Files that ended in any other state
    pub fn files_skipped(&self) -> usize {
        self.files.len() - self.files_processed()
    }

    /// Sum of verified row counts
    pub fn rows_loaded(&self) -> u64 {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref())
            .map(|r| r.actual_rows)
            .sum()
    }

    /// The run's only terminal outcome
    pub fn summary_line(&self) -> String {
        format!(
            "completed with {} files processed, {} skipped",
            self.files_processed(),
            self.files_skipped()
        )
    }

    /// Get formatted duration
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else if secs > 0 {
            format!("{}s", secs)
        } else {
            format!("{}ms", self.duration_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RowCountMode;

    fn report(states: &[FileState]) -> RunReport {
        RunReport {
            run_id: "run-1".to_string(),
            started_at: Utc::now(),
            duration_ms: 65_000,
            ingest_dir: PathBuf::from("/srv/uploads"),
            schema: None,
            files: states
                .iter()
                .enumerate()
                .map(|(i, state)| {
                    let mut file = FileReport::new(format!("f{i}.csv"), format!("f{i}"));
                    file.state = *state;
                    file
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_state_transitions() {
        use FileState::*;
        assert!(Pending.can_transition_to(Sanitizing));
        assert!(Pending.can_transition_to(ResolveFailed));
        assert!(Loading.can_transition_to(Verified));
        assert!(!Pending.can_transition_to(Verified));
        assert!(!Verified.can_transition_to(LoadFailed));
        assert!(!ResolveFailed.can_transition_to(Sanitizing));
        assert!(LoadFailed.is_terminal());
        assert!(!Loading.is_terminal());
    }

    #[test]
    fn test_file_report_rejects_illegal_transition() {
        let mut file = FileReport::new("Menu.csv", "Menu");
        assert!(!file.advance(FileState::Verified));
        assert_eq!(file.state, FileState::Pending);

        file.fail(FileState::ResolveFailed, "no columns");
        assert_eq!(file.state, FileState::ResolveFailed);
        assert_eq!(file.error.as_deref(), Some("no columns"));
    }

    #[test]
    fn test_summary_line() {
        let report = report(&[
            FileState::Verified,
            FileState::ResolveFailed,
            FileState::Verified,
            FileState::LoadFailed,
        ]);
        assert_eq!(report.files_processed(), 2);
        assert_eq!(report.files_skipped(), 2);
        assert_eq!(
            report.summary_line(),
            "completed with 2 files processed, 2 skipped"
        );
        assert_eq!(report.duration_formatted(), "1m 5s");
    }

    #[test]
    fn test_state_serializes_upper_case() {
        let json = serde_json::to_string(&FileState::ResolveFailed).unwrap();
        assert_eq!(json, "\"RESOLVE_FAILED\"");
    }

    #[test]
    fn test_rows_loaded() {
        let mut report = report(&[FileState::Verified, FileState::Verified]);
        report.files[0].result = Some(LoadResult::new(10, 9, RowCountMode::Exact));
        report.files[1].result = Some(LoadResult::new(5, 5, RowCountMode::Exact));
        assert_eq!(report.rows_loaded(), 14);
    }
}
