//! Field sanitization for bulk loading
//!
//! Source CSVs are free-text exports: names and descriptions contain commas,
//! quotes, backslashes and the occasional embedded newline. Before a file is
//! handed to the engine every field is rewritten into one of two shapes:
//!
//! - a bare numeric token (`42`, `-0.5`, `1e3`), passed through unquoted
//! - a backtick-enclosed text token with `\` and `` ` `` backslash-escaped
//!
//! An empty field becomes a truly empty token, which the loader turns into
//! `NULL` through `NULLIF(@col, '')`.
//!
//! Line feeds and carriage returns inside a field are written as `\n` and
//! `\r` so that every record occupies exactly one line of the output file.
//!
//! # Numeric classification
//!
//! A field is numeric when it parses as a float. This is a heuristic: text
//! that merely looks numeric (a dish called `1984`, a menu year `2023`, a
//! sponsor named `Nan`) is left unquoted. The engine still stores it in a
//! text column, but the transform is not round-trip safe for such values.

use std::path::Path;

use super::error::IngestError;

/// Character used to enclose text fields
pub const QUOTE: char = '`';

/// Escape character understood by the loader
pub const ESCAPE: char = '\\';

/// Field delimiter
pub const DELIMITER: u8 = b',';

/// Escape backslashes, backticks and line breaks in a raw field
pub fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

/// Check whether a value parses as a floating-point number
///
/// Accepts surrounding whitespace, signs, exponents, `inf`/`infinity`/`nan`
/// in any case and underscores placed between two digits.
pub fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }

    if !trimmed.contains('_') {
        return trimmed.parse::<f64>().is_ok();
    }

    let bytes = trimmed.as_bytes();
    let separators_ok = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'_'
            || (i > 0
                && i + 1 < bytes.len()
                && bytes[i - 1].is_ascii_digit()
                && bytes[i + 1].is_ascii_digit())
    });
    separators_ok && trimmed.replace('_', "").parse::<f64>().is_ok()
}

/// Sanitize a single raw field
pub fn sanitize_field(raw: &str) -> String {
    let escaped = escape_field(raw);
    if looks_numeric(&escaped) {
        return escaped;
    }

    let quoted = format!("{QUOTE}{escaped}{QUOTE}");
    if quoted.len() == 2 {
        // empty source field: leave the token empty so it loads as NULL
        String::new()
    } else {
        quoted
    }
}

/// Sanitize every field of a record, preserving order
pub fn sanitize_record<S: AsRef<str>>(record: &[S]) -> Vec<String> {
    record.iter().map(|f| sanitize_field(f.as_ref())).collect()
}

/// Statistics from sanitizing a file
#[derive(Debug, Clone, Default)]
pub struct SanitizeStats {
    /// Records written, header included
    pub rows: u64,
    /// Raw header fields of the source file
    pub header: Vec<String>,
}

impl SanitizeStats {
    /// Records written, header excluded
    pub fn data_rows(&self) -> u64 {
        self.rows.saturating_sub(1)
    }
}

/// Sanitize a whole CSV file into `output`
///
/// The header row is sanitized like any other record; the loader skips it.
pub fn sanitize_file(input: &Path, output: &Path) -> Result<SanitizeStats, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(input)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_path(output)?;

    let mut stats = SanitizeStats::default();
    let mut record = csv::StringRecord::new();

    while reader.read_record(&mut record)? {
        if stats.rows == 0 {
            stats.header = record.iter().map(str::to_string).collect();
        }
        writer.write_record(record.iter().map(sanitize_field))?;
        stats.rows += 1;
    }

    writer.flush()?;
    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        rows = stats.rows,
        "sanitized file"
    );
    Ok(stats)
}

/// Read only the header record of a CSV file
pub fn read_header(path: &Path) -> Result<Vec<String>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut record = csv::StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(record.iter().map(str::to_string).collect())
    } else {
        Ok(Vec::new())
    }
}

/// Split one sanitized line back into field values
///
/// Mirrors how the loader reads the file: backtick-enclosed or bare tokens,
/// backslash escapes, and empty tokens (or `\N`) as `None`.
pub fn split_sanitized_line(line: &str) -> Vec<Option<String>> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        let mut value = String::new();
        let mut raw = String::new();
        let enclosed = chars.peek() == Some(&QUOTE);
        if enclosed {
            chars.next();
        }

        let mut more = false;
        let mut closed = false;
        while let Some(ch) = chars.next() {
            match ch {
                ESCAPE => {
                    raw.push(ch);
                    if let Some(next) = chars.next() {
                        raw.push(next);
                        value.push(unescape_char(next));
                    }
                }
                QUOTE if enclosed && !closed => closed = true,
                ',' if !enclosed || closed => {
                    more = true;
                    break;
                }
                _ if closed => {}
                _ => {
                    raw.push(ch);
                    value.push(ch);
                }
            }
        }

        let null = value.is_empty() || (!enclosed && raw == "\\N");
        fields.push(if null { None } else { Some(value) });

        if !more {
            break;
        }
    }

    fields
}

/// Decode a single sanitized token back into its source value
pub fn decode_field(token: &str) -> Option<String> {
    split_sanitized_line(token).into_iter().next().flatten()
}

fn unescape_char(ch: char) -> char {
    match ch {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        '0' => '\0',
        'b' => '\u{8}',
        'Z' => '\u{1a}',
        other => other,
    }
}
