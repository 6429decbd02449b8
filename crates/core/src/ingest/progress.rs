//! Progress reporting for the file loop
//!
//! Bars are drawn with `indicatif`. A hidden reporter keeps the same API so
//! the executor never branches on whether progress is shown.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for a pipeline run
pub struct LoadProgress {
    files_bar: ProgressBar,
    rows_bar: ProgressBar,
}

impl LoadProgress {
    /// Create a reporter for `total_files` files
    pub fn new(total_files: u64) -> Self {
        let multi = MultiProgress::new();

        let files_bar = multi.add(ProgressBar::new(total_files));
        files_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} files {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  "),
        );
        files_bar.enable_steady_tick(Duration::from_millis(100));

        let rows_bar = multi.add(ProgressBar::new_spinner());
        rows_bar.set_style(
            ProgressStyle::with_template("{spinner:.yellow} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        rows_bar.set_message("Rows loaded: 0");
        rows_bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            files_bar,
            rows_bar,
        }
    }

    /// Create a reporter that draws nothing
    pub fn hidden() -> Self {
        Self {
            files_bar: ProgressBar::hidden(),
            rows_bar: ProgressBar::hidden(),
        }
    }

    /// Show which file is being worked on
    pub fn start_file(&self, file: &str, step: &str) {
        self.files_bar.set_message(format!("{step} {file}"));
    }

    /// Mark a file as done
    pub fn finish_file(&self) {
        self.files_bar.inc(1);
    }

    /// Update the running row total
    pub fn update_rows(&self, rows: u64) {
        self.rows_bar
            .set_message(format!("Rows loaded: {}", format_number(rows)));
    }

    /// Mark a file as skipped
    pub fn skip_file(&self, file: &str, reason: &str) {
        self.files_bar
            .println(format!("  ⊘ Skipped {}: {}", file, reason));
        self.files_bar.inc(1);
    }

    /// Report a warning
    pub fn warn(&self, msg: &str) {
        self.files_bar.println(format!("  ⚠ Warning: {}", msg));
    }

    /// Finish with a summary message
    pub fn finish(&self, msg: &str) {
        self.files_bar.finish_with_message(format!("✓ {}", msg));
        self.rows_bar.finish_and_clear();
    }
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a signed number with thousand separators
pub fn format_signed(n: i64) -> String {
    if n < 0 {
        format!("-{}", format_number(n.unsigned_abs()))
    } else {
        format_number(n as u64)
    }
}
