//! Single-sheet `.xlsx` writer.
//!
//! Writes the smallest part set Excel and calamine accept: content types, package
//! relationships, workbook, one worksheet and the shared-strings table.

use chrono::NaiveDateTime;
use polars::prelude::*;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use ::zip::write::SimpleFileOptions;
use ::zip::{CompressionMethod, ZipWriter};

use crate::error::{SheetMergeError, SheetMergeResult};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SHEET_NAME: &str = "Sheet1";

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

/// Spreadsheet column letters for a 0-based column index: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

pub const DEFAULT_FILE_PREFIX: &str = "merged";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

/// How saved workbooks are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub file_prefix: String,
    pub timestamp_format: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl ExportOptions {
    pub fn file_name(&self, now: NaiveDateTime) -> SheetMergeResult<String> {
        export_file_name(&self.file_prefix, &self.timestamp_format, now)
    }
}

/// `{prefix}_{timestamp}.xlsx`, with `timestamp_format` as a strftime pattern.
pub fn export_file_name(
    prefix: &str,
    timestamp_format: &str,
    now: NaiveDateTime,
) -> SheetMergeResult<String> {
    let mut stamp = String::new();
    write!(stamp, "{}", now.format(timestamp_format)).map_err(|_| {
        SheetMergeError::Export(format!(
            "Invalid timestamp format '{}' for export file name",
            timestamp_format
        ))
    })?;
    Ok(format!("{}_{}.xlsx", prefix, stamp))
}

/// Control characters other than tab, newline and carriage return are not allowed in
/// XML 1.0. Spreadsheet files carry them as `_xHHHH_`, and a literal `_x` that would read
/// back as such an escape has its underscore escaped as `_x005F_`.
pub fn escape_control_chars(s: &str) -> String {
    if !s.chars().any(|c| needs_escape(c) || c == '_') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if needs_escape(c) {
            let _ = write!(out, "_x{:04X}_", c as u32);
        } else if c == '_' && looks_like_escape(&s[i..]) {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    out
}

fn needs_escape(c: char) -> bool {
    (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r')
}

/// True when `rest` starts with `_xHHHH_`.
fn looks_like_escape(rest: &str) -> bool {
    let b = rest.as_bytes();
    b.len() >= 7
        && b[1] == b'x'
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}

/// One worksheet cell ready for serialization.
enum CellValue {
    Number(String),
    Bool(bool),
    Shared(usize),
}

/// Interned strings in first-use order.
#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    strings: Vec<String>,
}

impl SharedStrings {
    fn intern(&mut self, s: &str) -> usize {
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.strings.len();
        self.index.insert(s.to_string(), i);
        self.strings.push(s.to_string());
        i
    }
}

fn cell_value(value: &AnyValue, strings: &mut SharedStrings) -> Option<CellValue> {
    let cell = match value {
        AnyValue::Null => return None,
        AnyValue::Boolean(b) => CellValue::Bool(*b),
        AnyValue::Int8(v) => CellValue::Number(v.to_string()),
        AnyValue::Int16(v) => CellValue::Number(v.to_string()),
        AnyValue::Int32(v) => CellValue::Number(v.to_string()),
        AnyValue::Int64(v) => CellValue::Number(v.to_string()),
        AnyValue::UInt8(v) => CellValue::Number(v.to_string()),
        AnyValue::UInt16(v) => CellValue::Number(v.to_string()),
        AnyValue::UInt32(v) => CellValue::Number(v.to_string()),
        AnyValue::UInt64(v) => CellValue::Number(v.to_string()),
        AnyValue::Float32(v) if v.is_finite() => CellValue::Number(v.to_string()),
        AnyValue::Float64(v) if v.is_finite() => CellValue::Number(v.to_string()),
        AnyValue::String(s) => CellValue::Shared(strings.intern(&escape_control_chars(s))),
        AnyValue::StringOwned(s) => {
            CellValue::Shared(strings.intern(&escape_control_chars(s.as_str())))
        }
        other => CellValue::Shared(strings.intern(&escape_control_chars(&other.str_value()))),
    };
    Some(cell)
}

fn write_cell(
    writer: &mut Writer<Vec<u8>>,
    reference: &str,
    cell: &CellValue,
) -> std::io::Result<()> {
    let (kind, text) = match cell {
        CellValue::Number(n) => (None, n.clone()),
        CellValue::Bool(b) => (Some("b"), if *b { "1" } else { "0" }.to_string()),
        CellValue::Shared(i) => (Some("s"), i.to_string()),
    };
    let mut start = BytesStart::new("c").with_attributes([("r", reference)]);
    if let Some(kind) = kind {
        start.push_attribute(("t", kind));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Start(BytesStart::new("v")))?;
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    writer.write_event(Event::End(BytesEnd::new("v")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn xml_writer() -> std::io::Result<Writer<Vec<u8>>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn worksheet_xml(df: &DataFrame, strings: &mut SharedStrings) -> SheetMergeResult<Vec<u8>> {
    let mut writer = xml_writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", MAIN_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let columns: Vec<&Column> = df
        .get_column_names()
        .into_iter()
        .map(|name| df.column(name.as_str()))
        .collect::<PolarsResult<_>>()?;
    let letters: Vec<String> = (0..columns.len()).map(column_letters).collect();

    let header_row = "1".to_string();
    writer.write_event(Event::Start(
        BytesStart::new("row").with_attributes([("r", header_row.as_str())]),
    ))?;
    for (col, letter) in columns.iter().zip(&letters) {
        let cell = CellValue::Shared(strings.intern(&escape_control_chars(col.name().as_str())));
        write_cell(&mut writer, &format!("{}1", letter), &cell)?;
    }
    writer.write_event(Event::End(BytesEnd::new("row")))?;

    for row in 0..df.height() {
        let row_number = (row + 2).to_string();
        writer.write_event(Event::Start(
            BytesStart::new("row").with_attributes([("r", row_number.as_str())]),
        ))?;
        for (col, letter) in columns.iter().zip(&letters) {
            let value = col.get(row)?;
            if let Some(cell) = cell_value(&value, strings) {
                write_cell(&mut writer, &format!("{}{}", letter, row_number), &cell)?;
            }
        }
        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn shared_strings_xml(strings: &SharedStrings) -> SheetMergeResult<Vec<u8>> {
    let mut writer = xml_writer()?;
    let count = strings.strings.len().to_string();
    writer.write_event(Event::Start(BytesStart::new("sst").with_attributes([
        ("xmlns", MAIN_NS),
        ("count", count.as_str()),
        ("uniqueCount", count.as_str()),
    ])))?;
    for s in &strings.strings {
        writer.write_event(Event::Start(BytesStart::new("si")))?;
        writer.write_event(Event::Start(
            BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(s)))?;
        writer.write_event(Event::End(BytesEnd::new("t")))?;
        writer.write_event(Event::End(BytesEnd::new("si")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("sst")))?;
    Ok(writer.into_inner())
}

fn workbook_xml() -> SheetMergeResult<Vec<u8>> {
    let mut writer = xml_writer()?;
    writer.write_event(Event::Start(BytesStart::new("workbook").with_attributes([
        ("xmlns", MAIN_NS),
        (
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        ),
    ])))?;
    writer.write_event(Event::Start(BytesStart::new("sheets")))?;
    writer.write_event(Event::Empty(BytesStart::new("sheet").with_attributes([
        ("name", SHEET_NAME),
        ("sheetId", "1"),
        ("r:id", "rId1"),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("sheets")))?;
    writer.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(writer.into_inner())
}

/// Serialize `df` as an `.xlsx` workbook: header row, then one row per record.
/// Nulls are left as absent cells.
pub fn write_xlsx(df: &DataFrame) -> SheetMergeResult<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let sheet = worksheet_xml(df, &mut strings)?;
    let shared = shared_strings_xml(&strings)?;
    let workbook = workbook_xml()?;

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("xl/workbook.xml", &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet),
        ("xl/sharedStrings.xml", &shared),
    ];

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in parts {
        zip.start_file(name, options)?;
        zip.write_all(data)?;
    }
    let bytes = zip.finish()?.into_inner();
    tracing::debug!(
        rows = df.height(),
        cols = df.width(),
        bytes = bytes.len(),
        "wrote xlsx"
    );
    Ok(bytes)
}

/// Write `df` to `dir/file_name`, creating `dir` if needed. Returns the full path.
pub fn save_xlsx(df: &DataFrame, dir: &Path, file_name: &str) -> SheetMergeResult<PathBuf> {
    let bytes = write_xlsx(df)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), "saved merged workbook");
    Ok(path)
}
