#![allow(dead_code)]

use polars::prelude::*;
use sheetmerge::export::write_xlsx;
use std::path::{Path, PathBuf};

/// Primary table of the two-row reference scenario. "2 " carries a trailing space.
pub fn primary_frame() -> DataFrame {
    df!(
        "id" => ["1", "2 "],
        "name" => ["Alice", "Bob"],
    )
    .unwrap()
}

pub fn source_frame() -> DataFrame {
    df!(
        "sku" => ["1", "2"],
        "qty" => [5i64, 9],
    )
    .unwrap()
}

pub fn workbook_bytes(df: &DataFrame) -> Vec<u8> {
    write_xlsx(df).unwrap()
}

/// Write `df` as an .xlsx file named `name` in `dir`.
pub fn write_workbook(dir: &Path, name: &str, df: &DataFrame) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, workbook_bytes(df)).unwrap();
    path
}

pub fn column_strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    let column = df
        .column(name)
        .unwrap()
        .cast(&DataType::String)
        .unwrap();
    column
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

pub fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// A raw worksheet cell, for workbooks whose columns mix value kinds.
pub enum RawCell<'a> {
    Text(&'a str),
    Number(f64),
}

/// Minimal single-sheet .xlsx with inline strings. The first row is the header.
pub fn raw_workbook(rows: &[Vec<RawCell>]) -> Vec<u8> {
    use std::io::Write;
    use ::zip::write::SimpleFileOptions;

    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        sheet.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", sheetmerge::export::column_letters(c), r + 1);
            match cell {
                RawCell::Text(s) => sheet.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    reference, s
                )),
                RawCell::Number(n) => {
                    sheet.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n))
                }
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    let mut zip = ::zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in parts {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
