//! Output formatting for CLI

use clap::ValueEnum;
use menuload_core::ingest::{format_number, format_signed};
use menuload_core::{FileReport, FileState, RunReport};

use crate::error::CliError;

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// The full run report as JSON
    Json,
}

/// Print a run report to stdout
pub fn print_report(report: &RunReport, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            if let Some(schema) = &report.schema {
                println!(
                    "Schema script: {} statements executed, {} failed",
                    schema.executed, schema.failed
                );
            }
            for file in &report.files {
                println!("{}", format_file(file));
            }
            for warning in &report.warnings {
                println!("[WARNING] {}", warning);
            }
            println!();
            println!("Run {} {} in {}", report.run_id, report.summary_line(), report.duration_formatted());
        }
    }
    Ok(())
}

/// Render one file's outcome
pub fn format_file(file: &FileReport) -> String {
    let mut out = match (&file.state, &file.result) {
        (FileState::Verified, Some(result)) => format!(
            "[OK] Loaded: {} -> {}\n\
             - Rows expected: {}\n\
             - Rows loaded:   {} ({:.2}%)\n\
             - Rows missing:  {} ({:.2}%)",
            file.file,
            file.table,
            format_number(result.expected_rows),
            format_number(result.actual_rows),
            result.loaded_percentage,
            format_signed(result.skipped_rows),
            result.skipped_percentage,
        ),
        (state, _) => format!(
            "[ERROR] {} -> {}: {} ({})",
            file.file,
            file.table,
            file.error.as_deref().unwrap_or("no detail"),
            state
        ),
    };

    for warning in &file.warnings {
        out.push_str(&format!("\n[WARNING] {}", warning));
    }
    out
}
