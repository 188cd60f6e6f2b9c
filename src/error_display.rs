//! User-facing error message formatting.
//!
//! Matches on error variants (SheetMergeError, PolarsError, io::ErrorKind) rather
//! than parsing strings.

use polars::prelude::PolarsError;
use std::io;

use crate::error::SheetMergeError;

/// One-line message for the status area or stderr.
pub fn user_message(err: &SheetMergeError) -> String {
    match err {
        SheetMergeError::FileFormat(msg) => format!("Could not read workbook: {}", msg),
        SheetMergeError::Configuration(msg) => msg.clone(),
        SheetMergeError::MissingColumn { table, column } => format!(
            "Column '{}' not found in the {} workbook. Check the key and column choices.",
            column, table
        ),
        SheetMergeError::Merge(msg) => format!("Merge failed: {}", msg),
        SheetMergeError::Polars(pe) => format!("Merge failed: {}", user_message_from_polars(pe)),
        SheetMergeError::Export(msg) => format!("Could not save workbook: {}", msg),
        SheetMergeError::Zip(e) => format!("Could not save workbook: {}", e),
        SheetMergeError::Io(e) => user_message_from_io(e, None),
    }
}

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!("Column not found: {}", msg),
        PE::Duplicate(msg) => format!("Duplicate column in result: {}", msg),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::InvalidOperation(msg) => format!("Operation not allowed: {}", msg),
        PE::OutOfBounds(msg) => format!("Index or row out of bounds: {}", msg),
        PE::ComputeError(msg) => msg.to_string(),
        PE::Context { error, msg } => format!("{}: {}", msg, user_message_from_polars(error)),
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check file access.".to_string(),
        ErrorKind::AlreadyExists => "File already exists.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        ErrorKind::Other => {
            let msg = err.to_string();
            if msg.contains("space left") {
                return "No space left on device. Free up disk space and try again.".to_string();
            }
            if msg.contains("Is a directory") {
                return "Path is a directory, not a file.".to_string();
            }
            return match context {
                Some(_) => format!("I/O error: {}", msg),
                None => msg,
            };
        }
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a color_eyre Report by walking its cause chain for known error types.
pub fn user_message_from_report(report: &color_eyre::eyre::Report) -> String {
    for cause in report.chain() {
        if let Some(e) = cause.downcast_ref::<SheetMergeError>() {
            return user_message(e);
        }
        if let Some(pe) = cause.downcast_ref::<PolarsError>() {
            return user_message_from_polars(pe);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return user_message_from_io(io_err, None);
        }
    }

    // First line only; avoids dumping a full report into the status bar
    let display = report.to_string();
    display
        .lines()
        .next()
        .map(str::trim)
        .unwrap_or("An error occurred")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableSide;

    #[test]
    fn test_user_message_from_io_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "No such file");
        let msg = user_message_from_io(&err, None);
        assert!(msg.contains("not found"), "got: {}", msg);
    }

    #[test]
    fn test_missing_column_message_names_table() {
        let err = SheetMergeError::MissingColumn {
            table: TableSide::Source,
            column: "sku".to_string(),
        };
        let msg = user_message(&err);
        assert!(msg.contains("'sku'"), "got: {}", msg);
        assert!(msg.contains("source"), "got: {}", msg);
    }

    #[test]
    fn test_configuration_message_is_passed_through() {
        let err = SheetMergeError::Configuration("No columns selected".to_string());
        assert_eq!(user_message(&err), "No columns selected");
    }

    #[test]
    fn test_report_finds_wrapped_error() {
        let report = color_eyre::eyre::Report::new(SheetMergeError::FileFormat(
            "bad zip".to_string(),
        ))
        .wrap_err("loading a.xlsx");
        let msg = user_message_from_report(&report);
        assert!(msg.contains("bad zip"), "got: {}", msg);
    }

    #[test]
    fn test_user_message_from_polars_column_not_found() {
        let err = PolarsError::ColumnNotFound("foo".into());
        let msg = user_message_from_polars(&err);
        assert!(msg.contains("Column not found: foo"), "got: {}", msg);
    }
}
