use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sheetmerge::merge_form::FormFocus;
use sheetmerge::{App, AppEvent, StatusKind, TableSide};
use std::path::Path;
use std::sync::mpsc;
use tempfile::TempDir;

mod common;
use common::{primary_frame, source_frame, write_workbook};

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Feed an event and every follow-up event it produces.
fn dispatch(app: &mut App, event: AppEvent) {
    let mut next = app.event(&event);
    while let Some(event) = next {
        next = app.event(&event);
    }
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        dispatch(app, key(KeyCode::Char(c)));
    }
}

fn loaded_app(dir: &Path) -> App {
    let primary = write_workbook(dir, "people.xlsx", &primary_frame());
    let source = write_workbook(dir, "stock.xlsx", &source_frame());
    let (tx, _rx) = mpsc::channel();
    let mut app = App::new(tx);
    app.set_output_dir(dir.join("out"));
    dispatch(&mut app, AppEvent::Load(TableSide::Primary, primary));
    dispatch(&mut app, AppEvent::Load(TableSide::Source, source));
    app
}

#[test]
fn test_app_creation() {
    let (tx, _) = mpsc::channel();
    let app = App::new(tx);
    assert_eq!(app.form.focus, FormFocus::PrimaryPath);
    assert!(app.session().primary().is_none());
    assert!(!app.is_busy());
}

#[test]
fn test_load_is_deferred_one_event() {
    let dir = TempDir::new().unwrap();
    let path = write_workbook(dir.path(), "people.xlsx", &primary_frame());
    let (tx, _rx) = mpsc::channel();
    let mut app = App::new(tx);

    let next = app.event(&AppEvent::Load(TableSide::Primary, path));
    assert!(matches!(next, Some(AppEvent::DoLoad(TableSide::Primary, _))));
    assert!(app.is_busy());
    assert!(app.session().primary().is_none());

    app.event(&next.unwrap());
    assert!(!app.is_busy());
    assert_eq!(app.session().primary().unwrap().name, "people.xlsx");
    assert_eq!(app.form.key_a.value(), Some("id"));
    assert_eq!(app.status().kind, StatusKind::Success);
}

#[test]
fn test_full_workflow_with_keys() {
    let dir = TempDir::new().unwrap();
    let primary = write_workbook(dir.path(), "people.xlsx", &primary_frame());
    let source = write_workbook(dir.path(), "stock.xlsx", &source_frame());
    let (tx, _rx) = mpsc::channel();
    let mut app = App::new(tx);
    app.set_output_dir(dir.path().join("out"));

    // 1. Type both paths; Enter loads and moves focus on
    type_text(&mut app, &primary.display().to_string());
    dispatch(&mut app, key(KeyCode::Enter));
    assert_eq!(app.form.focus, FormFocus::SourcePath);
    type_text(&mut app, &source.display().to_string());
    dispatch(&mut app, key(KeyCode::Enter));
    assert_eq!(app.form.focus, FormFocus::KeyA);
    assert_eq!(app.form.key_b.value(), Some("sku"));

    // 2. Keys default to the first column; select "qty"
    dispatch(&mut app, key(KeyCode::Tab));
    dispatch(&mut app, key(KeyCode::Tab));
    assert_eq!(app.form.focus, FormFocus::Columns);
    dispatch(&mut app, key(KeyCode::Char(' ')));
    assert_eq!(app.form.columns.selected(), ["qty".to_string()].as_slice());

    // 3. Merge
    dispatch(&mut app, key(KeyCode::Char('m')));
    let result = app.session().result().expect("merge result");
    assert_eq!(result.frame.height(), 2);
    assert_eq!(app.session().history().len(), 1);
    assert_eq!(app.status().kind, StatusKind::Success);

    // 4. Save
    dispatch(&mut app, key(KeyCode::Char('s')));
    assert_eq!(app.status().kind, StatusKind::Success, "{}", app.status().message);
    let saved: Vec<_> = std::fs::read_dir(dir.path().join("out"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].starts_with("merged_") && saved[0].ends_with(".xlsx"));
}

#[test]
fn test_merge_without_selection_warns() {
    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(dir.path());
    assert!(!app.form.can_merge());

    dispatch(&mut app, key(KeyCode::F(5)));
    assert_eq!(app.status().kind, StatusKind::Warning);
    assert!(app.session().result().is_none());
    assert!(app.session().history().is_empty());
}

#[test]
fn test_save_before_merge_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(dir.path());
    dispatch(&mut app, AppEvent::Save);
    assert_eq!(app.status().kind, StatusKind::Error);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_bad_path_keeps_previous_table() {
    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(dir.path());
    dispatch(
        &mut app,
        AppEvent::Load(TableSide::Primary, dir.path().join("missing.xlsx")),
    );
    assert_eq!(app.status().kind, StatusKind::Error);
    assert_eq!(app.session().primary().unwrap().name, "people.xlsx");
}

#[test]
fn test_reset_clears_session_and_form() {
    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(dir.path());
    app.form.columns.toggle("qty");
    dispatch(&mut app, AppEvent::Merge);
    assert_eq!(app.session().history().len(), 1);

    dispatch(&mut app, AppEvent::Reset);
    assert!(app.session().primary().is_none());
    assert!(app.session().result().is_none());
    assert!(app.session().history().is_empty());
    assert!(app.form.key_a.value().is_none());
    assert!(app.form.columns.candidates().is_empty());
    assert_eq!(app.form.focus, FormFocus::PrimaryPath);
}

#[test]
fn test_letters_are_typed_in_path_fields() {
    let (tx, _rx) = mpsc::channel();
    let mut app = App::new(tx);
    // "q" quits elsewhere, but here it is part of a file name
    let next = app.event(&key(KeyCode::Char('q')));
    assert!(next.is_none());
    assert_eq!(app.form.primary_path.value(), "q");

    app.form.set_focus(FormFocus::MergeButton);
    assert!(matches!(app.event(&key(KeyCode::Char('q'))), Some(AppEvent::Exit)));
}

#[test]
fn test_history_and_help_toggles() {
    let (tx, _rx) = mpsc::channel();
    let mut app = App::new(tx);
    app.form.set_focus(FormFocus::KeyA);
    let shown = app.history_visible();
    app.event(&key(KeyCode::Char('h')));
    assert_eq!(app.history_visible(), !shown);

    app.event(&key(KeyCode::Char('?')));
    assert!(app.help_visible());
    // keys are swallowed while help is open
    assert!(app.event(&key(KeyCode::Char('m'))).is_none());
    app.event(&key(KeyCode::Esc));
    assert!(!app.help_visible());
}

#[test]
fn test_render_after_merge() {
    use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

    let dir = TempDir::new().unwrap();
    let mut app = loaded_app(dir.path());
    app.form.columns.toggle("qty");
    dispatch(&mut app, AppEvent::Merge);

    let area = Rect::new(0, 0, 100, 40);
    let mut buf = Buffer::empty(area);
    (&mut app).render(area, &mut buf);
    let text: String = (0..area.height)
        .flat_map(|y| (0..area.width).map(move |x| (x, y)))
        .map(|(x, y)| buf[(x, y)].symbol().to_string())
        .collect();
    assert!(text.contains("Alice"));
    assert!(text.contains("History (1)"));
}
