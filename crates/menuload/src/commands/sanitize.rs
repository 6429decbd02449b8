//! The `sanitize` command

use std::path::PathBuf;

use menuload_core::ingest::{format_number, sanitize_file};

use crate::error::CliError;

/// Arguments for the `sanitize` command
pub struct SanitizeArgs {
    /// Source CSV
    pub input: PathBuf,
    /// Where to write the load-ready file
    pub output: PathBuf,
}

/// Handle the `sanitize` command
pub fn handle_sanitize(args: &SanitizeArgs) -> Result<(), CliError> {
    if args.input == args.output {
        return Err(CliError::InvalidArgument(
            "input and output must be different files".to_string(),
        ));
    }

    let stats = sanitize_file(&args.input, &args.output)?;
    println!(
        "Sanitized {} data rows ({} columns) into {}",
        format_number(stats.data_rows()),
        stats.header.len(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_writes_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("Dish.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "id,name\n1,Soup\n").unwrap();

        handle_sanitize(&SanitizeArgs {
            input,
            output: output.clone(),
        })
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "`id`,`name`\n1,`Soup`\n"
        );
    }

    #[test]
    fn test_same_path_is_rejected() {
        let args = SanitizeArgs {
            input: PathBuf::from("Dish.csv"),
            output: PathBuf::from("Dish.csv"),
        };
        assert!(matches!(
            handle_sanitize(&args),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
