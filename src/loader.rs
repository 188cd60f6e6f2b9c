//! Workbook decoding: first sheet of an Excel/ODS workbook into a polars DataFrame.
//!
//! The first row is the header. Column types are inferred per column from the
//! calamine cells (see [`infer_column_type`]).

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use sheetmerge_cli::WorkbookFormat;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

use crate::error::{SheetMergeError, SheetMergeResult};
use crate::error_display::user_message_from_polars;

/// A decoded workbook plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    /// File name shown in the UI and recorded in history.
    pub name: String,
    /// Content digest of the bytes this table was decoded from.
    pub digest: u64,
    pub frame: DataFrame,
}

impl LoadedTable {
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellColumnType {
    Int64,
    Float64,
    Boolean,
    Utf8,
    Date,
    Datetime,
}

/// Read a workbook file into memory. Returns the display name and the raw bytes.
///
/// Paths whose extension names some other kind of file (".csv", ".txt", ...) are
/// rejected up front; a missing or unknown-but-workbook extension is sniffed by content.
pub fn read_workbook_file(path: &Path) -> SheetMergeResult<(String, Vec<u8>)> {
    if WorkbookFormat::is_foreign_extension(path) {
        return Err(SheetMergeError::FileFormat(format!(
            "{} is not a workbook (expected .xlsx or .xls)",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)?;
    tracing::debug!(
        path = %path.display(),
        format = ?WorkbookFormat::from_path(path),
        bytes = bytes.len(),
        "read workbook file"
    );
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((name, bytes))
}

/// Decode the first sheet of a workbook. Column order is the header order; row order is
/// top to bottom.
pub fn load_workbook(bytes: &[u8]) -> SheetMergeResult<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    if workbook.sheet_names().is_empty() {
        return Err(SheetMergeError::FileFormat(
            "Workbook has no worksheets".to_string(),
        ));
    }
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetMergeError::FileFormat("Workbook has no first sheet".to_string()))??;

    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    let Some(header_row) = rows.first() else {
        return Err(SheetMergeError::FileFormat(
            "First sheet is empty; a header row is required".to_string(),
        ));
    };
    if header_row.iter().all(|c| calamine::DataType::is_empty(c)) {
        return Err(SheetMergeError::FileFormat(
            "First sheet has no header row".to_string(),
        ));
    }

    let headers = header_names(header_row);
    let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
    for (col_idx, name) in headers.iter().enumerate() {
        let cells: Vec<Option<&Data>> = rows[1..].iter().map(|row| row.get(col_idx)).collect();
        let inferred = infer_column_type(&cells);
        let series = cells_to_series(name, &cells, inferred).map_err(decode_error)?;
        columns.push(series.into());
    }
    let df = DataFrame::new(columns).map_err(decode_error)?;
    tracing::debug!(rows = df.height(), cols = df.width(), "decoded first sheet");
    Ok(df)
}

/// Polars failures while building the table are load failures, not merge failures.
fn decode_error(err: PolarsError) -> SheetMergeError {
    SheetMergeError::FileFormat(format!(
        "Could not build a table from the first sheet: {}",
        user_message_from_polars(&err)
    ))
}

/// Header cells as unique column names. Blank headers become `column_N`; repeated names
/// get `.1`, `.2`, ... appended.
fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(row.len());
    for (idx, cell) in row.iter().enumerate() {
        let raw = calamine::DataType::as_string(cell).unwrap_or_else(|| cell.to_string());
        let base = if raw.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            raw
        };
        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

/// Infers column type: prefers Int64 for whole-number floats; infers Date/Datetime for
/// calamine DateTime/DateTimeIso or for text-only columns that parse as ISO date/datetime.
/// A column mixing text with numbers or booleans stays text so no cell is reinterpreted.
fn infer_column_type(cells: &[Option<&Data>]) -> CellColumnType {
    use calamine::DataType as CalamineTrait;
    let mut has_string = false;
    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    let mut has_datetime = false;
    for cell in cells.iter().flatten() {
        if CalamineTrait::is_string(*cell) {
            has_string = true;
        }
        if CalamineTrait::is_float(*cell) {
            has_float = true;
        }
        if CalamineTrait::is_int(*cell) {
            has_int = true;
        }
        if CalamineTrait::is_bool(*cell) {
            has_bool = true;
        }
        if CalamineTrait::is_datetime(*cell) || CalamineTrait::is_datetime_iso(*cell) {
            has_datetime = true;
        }
    }
    let has_number = has_float || has_int;
    if has_string {
        if has_number || has_bool || has_datetime {
            return CellColumnType::Utf8;
        }
        let texts = || cells.iter().flatten().filter_map(|c| c.get_string());
        let all_parse = texts().all(|s| parse_naive_datetime_str(s).is_some());
        if texts().next().is_some() && all_parse {
            if parsed_cells_all_midnight(cells) {
                CellColumnType::Date
            } else {
                CellColumnType::Datetime
            }
        } else {
            CellColumnType::Utf8
        }
    } else if has_bool && (has_number || has_datetime) {
        // Mixed numbers and booleans cannot share a numeric column
        CellColumnType::Utf8
    } else if has_datetime {
        if has_number {
            CellColumnType::Utf8
        } else if parsed_cells_all_midnight(cells) {
            CellColumnType::Date
        } else {
            CellColumnType::Datetime
        }
    } else if has_number {
        let all_whole = cells.iter().flatten().all(|cell| {
            cell.as_f64()
                .is_none_or(|f| f.is_finite() && (f - f.trunc()).abs() < 1e-10)
        });
        if all_whole {
            CellColumnType::Int64
        } else {
            CellColumnType::Float64
        }
    } else if has_bool {
        CellColumnType::Boolean
    } else {
        CellColumnType::Utf8
    }
}

/// True if every cell that parses as datetime has time 00:00:00.
fn parsed_cells_all_midnight(cells: &[Option<&Data>]) -> bool {
    let midnight = NaiveTime::MIN;
    cells
        .iter()
        .flatten()
        .filter_map(|c| cell_to_naive_datetime(c))
        .all(|dt| dt.time() == midnight)
}

/// Converts a date-typed or text calamine cell to NaiveDateTime. Plain numbers are not
/// dates here even though Excel stores dates as serial numbers.
fn cell_to_naive_datetime(cell: &Data) -> Option<NaiveDateTime> {
    use calamine::DataType;
    match cell {
        Data::DateTime(_) => cell.as_datetime(),
        Data::DateTimeIso(s) | Data::String(s) => parse_naive_datetime_str(s),
        _ => None,
    }
}

/// Parses an ISO-style date/datetime string; tries FORMATS in order.
fn parse_naive_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Text for a cell in a String column. Error cells and blanks are missing; date cells
/// are written as ISO dates rather than Excel serials.
fn cell_text(cell: &Data) -> Option<String> {
    use calamine::DataType;
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::DateTime(_) => cell.as_datetime().map(|dt| {
            if dt.time() == NaiveTime::MIN {
                dt.format("%Y-%m-%d").to_string()
            } else {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        }),
        _ => cell.as_string().or_else(|| Some(cell.to_string())),
    }
}

/// Build a Polars Series from a column of calamine cells using the inferred type.
fn cells_to_series(
    name: &str,
    cells: &[Option<&Data>],
    col_type: CellColumnType,
) -> PolarsResult<Series> {
    use calamine::DataType as CalamineTrait;
    let series = match col_type {
        CellColumnType::Int64 => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.as_i64()))
                .collect();
            Series::new(name.into(), v)
        }
        CellColumnType::Float64 => {
            let v: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.as_f64()))
                .collect();
            Series::new(name.into(), v)
        }
        CellColumnType::Boolean => {
            let v: Vec<Option<bool>> = cells
                .iter()
                .map(|c| c.and_then(|cell| cell.get_bool()))
                .collect();
            Series::new(name.into(), v)
        }
        CellColumnType::Utf8 => {
            let v: Vec<Option<String>> = cells.iter().map(|c| c.and_then(cell_text)).collect();
            Series::new(name.into(), v)
        }
        CellColumnType::Date => {
            // NaiveDate::default() is the unix epoch
            let epoch = NaiveDate::default();
            let v: Vec<Option<i32>> = cells
                .iter()
                .map(|c| {
                    c.and_then(cell_to_naive_datetime)
                        .map(|dt| (dt.date() - epoch).num_days() as i32)
                })
                .collect();
            Series::new(name.into(), v).cast(&DataType::Date)?
        }
        CellColumnType::Datetime => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| {
                    c.and_then(cell_to_naive_datetime)
                        .map(|dt| dt.and_utc().timestamp_micros())
                })
                .collect();
            Series::new(name.into(), v)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
    };
    Ok(series)
}
