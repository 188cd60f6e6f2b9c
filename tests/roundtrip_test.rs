use polars::prelude::*;
use sheetmerge::export::{write_xlsx, XLSX_MIME};
use sheetmerge::loader::load_workbook;
use sheetmerge::{merge, JoinConfig, MergeOptions};

mod common;
use common::{column_strings, names, raw_workbook, source_frame, RawCell};

#[test]
fn test_exported_merge_loads_back_equal() {
    let a = df!("id" => ["1", "2 ", "3"], "name" => ["Alice", "Bob", "Cy"]).unwrap();
    let merged = merge(
        &a,
        &source_frame(),
        &JoinConfig::new("id", "sku", ["qty"]),
        &MergeOptions::default(),
    )
    .unwrap();

    let reloaded = load_workbook(&write_xlsx(&merged).unwrap()).unwrap();

    assert_eq!(names(&reloaded), names(&merged));
    assert_eq!(reloaded.height(), merged.height());
    for name in names(&merged) {
        assert_eq!(
            column_strings(&reloaded, &name),
            column_strings(&merged, &name),
            "column {name}"
        );
    }
}

#[test]
fn test_float_and_bool_columns_survive() {
    let df = df!(
        "id" => ["a", "b"],
        "price" => [1.25f64, 3.5],
        "active" => [true, false],
    )
    .unwrap();
    let reloaded = load_workbook(&write_xlsx(&df).unwrap()).unwrap();
    let price: Vec<Option<f64>> = reloaded
        .column("price")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(price, vec![Some(1.25), Some(3.5)]);
    let active: Vec<Option<bool>> = reloaded
        .column("active")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(active, vec![Some(true), Some(false)]);
}

#[test]
fn test_mime_type() {
    assert_eq!(
        XLSX_MIME,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
}

#[test]
fn test_date_column_survives() {
    let days = Series::new("day".into(), [Some(19_753i32), None, Some(19_754)])
        .cast(&DataType::Date)
        .unwrap();
    let df = DataFrame::new(vec![days.into()]).unwrap();

    let reloaded = load_workbook(&write_xlsx(&df).unwrap()).unwrap();

    assert_eq!(reloaded.column("day").unwrap().dtype(), &DataType::Date);
    let day = reloaded.column("day").unwrap().cast(&DataType::Int32).unwrap();
    let day: Vec<Option<i32>> = day.i32().unwrap().into_iter().collect();
    assert_eq!(day, vec![Some(19_753), None, Some(19_754)]);
}

#[test]
fn test_datetime_column_keeps_fractional_seconds() {
    // 2024-01-31 10:20:30.500 and 2024-02-01 00:00:01.250
    let micros = [1_706_696_430_500_000i64, 1_706_745_601_250_000];
    let stamps = Series::new("ts".into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
        .unwrap();
    let df = DataFrame::new(vec![stamps.into()]).unwrap();

    let reloaded = load_workbook(&write_xlsx(&df).unwrap()).unwrap();

    assert_eq!(
        reloaded.column("ts").unwrap().dtype(),
        &DataType::Datetime(TimeUnit::Microseconds, None)
    );
    let ts = reloaded.column("ts").unwrap().cast(&DataType::Int64).unwrap();
    let ts: Vec<Option<i64>> = ts.i64().unwrap().into_iter().collect();
    assert_eq!(ts, micros.map(Some).to_vec());
}

#[test]
fn test_mixed_text_and_number_column_loads_as_text() {
    let bytes = raw_workbook(&[
        vec![RawCell::Text("id"), RawCell::Text("when")],
        vec![RawCell::Number(1.0), RawCell::Text("2024-01-01")],
        vec![RawCell::Text("B-2"), RawCell::Number(5.0)],
    ]);

    let loaded = load_workbook(&bytes).unwrap();

    assert_eq!(loaded.column("id").unwrap().dtype(), &DataType::String);
    assert_eq!(loaded.column("when").unwrap().dtype(), &DataType::String);
    assert_eq!(
        column_strings(&loaded, "when"),
        vec![Some("2024-01-01".to_string()), Some("5".to_string())]
    );

    let reloaded = load_workbook(&write_xlsx(&loaded).unwrap()).unwrap();
    assert_eq!(
        column_strings(&reloaded, "id"),
        vec![Some("1".to_string()), Some("B-2".to_string())]
    );
    assert_eq!(column_strings(&reloaded, "when"), column_strings(&loaded, "when"));
}

#[test]
fn test_mixed_key_column_joins_as_text() {
    let primary = load_workbook(&raw_workbook(&[
        vec![RawCell::Text("id")],
        vec![RawCell::Number(1.0)],
        vec![RawCell::Text("B-2")],
    ]))
    .unwrap();
    let source = df!("sku" => ["B-2", "1"], "qty" => [9i64, 5]).unwrap();

    let merged = merge(
        &primary,
        &source,
        &JoinConfig::new("id", "sku", ["qty"]),
        &MergeOptions::default(),
    )
    .unwrap();

    assert_eq!(
        column_strings(&merged, "qty"),
        vec![Some("5".to_string()), Some("9".to_string())]
    );
}
