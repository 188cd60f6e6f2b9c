//! State behind the merge form: two path fields, two key pickers, the source-column
//! chooser and the action buttons.

use crossterm::event::{KeyCode, KeyEvent};

use crate::config::Theme;
use crate::error::TableSide;
use crate::merge::JoinConfig;
use crate::widgets::text_input::{TextInput, TextInputEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    PrimaryPath,
    SourcePath,
    KeyA,
    KeyB,
    Columns,
    MergeButton,
    SaveButton,
    ResetButton,
}

impl FormFocus {
    const ORDER: [FormFocus; 8] = [
        FormFocus::PrimaryPath,
        FormFocus::SourcePath,
        FormFocus::KeyA,
        FormFocus::KeyB,
        FormFocus::Columns,
        FormFocus::MergeButton,
        FormFocus::SaveButton,
        FormFocus::ResetButton,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_text_input(self) -> bool {
        matches!(self, FormFocus::PrimaryPath | FormFocus::SourcePath)
    }
}

/// What a key press in the form asks the App to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    None,
    Load(TableSide, String),
    Merge,
    Save,
    Reset,
    Cancel,
}

/// Single choice from a list of column names. Defaults to the first option.
#[derive(Debug, Clone, Default)]
pub struct KeyPicker {
    options: Vec<String>,
    selected: Option<usize>,
}

impl KeyPicker {
    /// Replace the options, keeping the current choice when it still exists.
    pub fn set_options(&mut self, options: Vec<String>) {
        let current = self.value().map(str::to_string);
        self.selected = current
            .and_then(|c| options.iter().position(|o| *o == c))
            .or(if options.is_empty() { None } else { Some(0) });
        self.options = options;
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn value(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }

    pub fn select(&mut self, name: &str) -> bool {
        match self.options.iter().position(|o| o == name) {
            Some(i) => {
                self.selected = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() as isize - 1;
        let current = self.selected.unwrap_or(0) as isize;
        self.selected = Some((current + delta).clamp(0, last) as usize);
    }

    pub fn clear(&mut self) {
        self.options.clear();
        self.selected = None;
    }
}

/// Multi-select over the source table's non-key columns. Selection order is kept and
/// becomes the output column order.
#[derive(Debug, Clone, Default)]
pub struct ColumnChooser {
    candidates: Vec<String>,
    cursor: usize,
    selected: Vec<String>,
}

impl ColumnChooser {
    /// Candidates are `all` minus `key`. Selections no longer offered are dropped.
    pub fn rebuild(&mut self, all: &[String], key: Option<&str>) {
        self.candidates = all
            .iter()
            .filter(|c| Some(c.as_str()) != key)
            .cloned()
            .collect();
        let candidates = &self.candidates;
        self.selected.retain(|s| candidates.contains(s));
        self.cursor = self.cursor.min(self.candidates.len().saturating_sub(1));
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 1-based position in the selection, if selected
    pub fn order_of(&self, name: &str) -> Option<usize> {
        self.selected.iter().position(|s| s == name).map(|i| i + 1)
    }

    pub fn toggle(&mut self, name: &str) {
        if let Some(i) = self.selected.iter().position(|s| s == name) {
            self.selected.remove(i);
        } else if self.candidates.iter().any(|c| c == name) {
            self.selected.push(name.to_string());
        }
    }

    pub fn toggle_at_cursor(&mut self) {
        if let Some(name) = self.candidates.get(self.cursor).cloned() {
            self.toggle(&name);
        }
    }

    pub fn select_all(&mut self) {
        for c in &self.candidates {
            if !self.selected.contains(c) {
                self.selected.push(c.clone());
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.candidates.is_empty() {
            return;
        }
        let last = self.candidates.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.selected.clear();
        self.cursor = 0;
    }
}

pub struct MergeForm {
    pub focus: FormFocus,
    pub primary_path: TextInput,
    pub source_path: TextInput,
    pub key_a: KeyPicker,
    pub key_b: KeyPicker,
    pub columns: ColumnChooser,
    source_columns: Vec<String>,
}

impl MergeForm {
    pub fn new(theme: &Theme) -> Self {
        let mut form = Self {
            focus: FormFocus::PrimaryPath,
            primary_path: TextInput::new().with_theme(theme),
            source_path: TextInput::new().with_theme(theme),
            key_a: KeyPicker::default(),
            key_b: KeyPicker::default(),
            columns: ColumnChooser::default(),
            source_columns: Vec::new(),
        };
        form.sync_focus();
        form
    }

    pub fn path_input(&mut self, side: TableSide) -> &mut TextInput {
        match side {
            TableSide::Primary => &mut self.primary_path,
            TableSide::Source => &mut self.source_path,
        }
    }

    /// Column names of a newly loaded table
    pub fn set_table_columns(&mut self, side: TableSide, columns: Vec<String>) {
        match side {
            TableSide::Primary => self.key_a.set_options(columns),
            TableSide::Source => {
                self.key_b.set_options(columns.clone());
                self.source_columns = columns;
                self.rebuild_columns();
            }
        }
    }

    fn rebuild_columns(&mut self) {
        self.columns
            .rebuild(&self.source_columns, self.key_b.value());
    }

    pub fn select_key(&mut self, side: TableSide, name: &str) -> bool {
        match side {
            TableSide::Primary => self.key_a.select(name),
            TableSide::Source => {
                let found = self.key_b.select(name);
                self.rebuild_columns();
                found
            }
        }
    }

    /// Merge is offered only with both keys chosen and at least one column selected.
    pub fn can_merge(&self) -> bool {
        self.key_a.value().is_some()
            && self.key_b.value().is_some()
            && !self.columns.selected().is_empty()
    }

    /// Current choices. Missing keys come through empty so the engine reports them.
    pub fn join_config(&self) -> JoinConfig {
        JoinConfig::new(
            self.key_a.value().unwrap_or_default(),
            self.key_b.value().unwrap_or_default(),
            self.columns.selected().iter().cloned(),
        )
    }

    pub fn set_focus(&mut self, focus: FormFocus) {
        self.focus = focus;
        self.sync_focus();
    }

    fn sync_focus(&mut self) {
        self.primary_path
            .set_focused(self.focus == FormFocus::PrimaryPath);
        self.source_path
            .set_focused(self.focus == FormFocus::SourcePath);
    }

    pub fn reset(&mut self) {
        self.primary_path.clear();
        self.source_path.clear();
        self.key_a.clear();
        self.key_b.clear();
        self.columns.clear();
        self.source_columns.clear();
        self.set_focus(FormFocus::PrimaryPath);
    }

    /// Keys that are not global shortcuts end up here.
    pub fn handle_key(&mut self, key: &KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Tab => {
                self.set_focus(self.focus.next());
                return FormAction::None;
            }
            KeyCode::BackTab => {
                self.set_focus(self.focus.prev());
                return FormAction::None;
            }
            _ => {}
        }

        match self.focus {
            FormFocus::PrimaryPath | FormFocus::SourcePath => {
                let side = if self.focus == FormFocus::PrimaryPath {
                    TableSide::Primary
                } else {
                    TableSide::Source
                };
                let input = self.path_input(side);
                match input.handle_key(key) {
                    TextInputEvent::Submit => {
                        let path = input.value().trim().to_string();
                        if path.is_empty() {
                            FormAction::None
                        } else {
                            FormAction::Load(side, path)
                        }
                    }
                    TextInputEvent::Cancel => FormAction::Cancel,
                    TextInputEvent::None => FormAction::None,
                }
            }
            FormFocus::KeyA => {
                self.key_a.move_by(list_delta(key));
                FormAction::None
            }
            FormFocus::KeyB => {
                let delta = list_delta(key);
                if delta != 0 {
                    self.key_b.move_by(delta);
                    self.rebuild_columns();
                }
                FormAction::None
            }
            FormFocus::Columns => {
                match key.code {
                    KeyCode::Char(' ') | KeyCode::Enter => self.columns.toggle_at_cursor(),
                    KeyCode::Char('a') => self.columns.select_all(),
                    KeyCode::Char('c') => self.columns.clear_selection(),
                    _ => self.columns.move_by(list_delta(key)),
                }
                FormAction::None
            }
            FormFocus::MergeButton if is_activate(key) => FormAction::Merge,
            FormFocus::SaveButton if is_activate(key) => FormAction::Save,
            FormFocus::ResetButton if is_activate(key) => FormAction::Reset,
            FormFocus::MergeButton | FormFocus::SaveButton | FormFocus::ResetButton => {
                FormAction::None
            }
        }
    }
}

fn is_activate(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter | KeyCode::Char(' '))
}

fn list_delta(key: &KeyEvent) -> isize {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => -1,
        KeyCode::Down | KeyCode::Char('j') => 1,
        KeyCode::PageUp => -10,
        KeyCode::PageDown => 10,
        KeyCode::Home => isize::MIN / 2,
        KeyCode::End => isize::MAX / 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn form() -> MergeForm {
        let mut form = MergeForm::new(&Theme::default());
        form.set_table_columns(TableSide::Primary, names(&["id", "name"]));
        form.set_table_columns(TableSide::Source, names(&["sku", "qty", "price"]));
        form
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_keys_default_to_first_column() {
        let form = form();
        assert_eq!(form.key_a.value(), Some("id"));
        assert_eq!(form.key_b.value(), Some("sku"));
        assert_eq!(form.columns.candidates(), names(&["qty", "price"]).as_slice());
    }

    #[test]
    fn test_selection_order_is_kept() {
        let mut form = form();
        form.columns.toggle("price");
        form.columns.toggle("qty");
        assert_eq!(form.join_config().selected_columns, names(&["price", "qty"]));
        assert_eq!(form.columns.order_of("qty"), Some(2));
        form.columns.toggle("price");
        assert_eq!(form.columns.selected(), names(&["qty"]).as_slice());
    }

    #[test]
    fn test_changing_key_b_drops_stale_selection() {
        let mut form = form();
        form.columns.toggle("qty");
        form.columns.toggle("price");
        assert!(form.select_key(TableSide::Source, "qty"));
        assert_eq!(form.columns.candidates(), names(&["sku", "price"]).as_slice());
        assert_eq!(form.columns.selected(), names(&["price"]).as_slice());
    }

    #[test]
    fn test_can_merge_requires_selection() {
        let mut form = form();
        assert!(!form.can_merge());
        form.columns.toggle("qty");
        assert!(form.can_merge());
    }

    #[test]
    fn test_reload_keeps_key_when_still_present() {
        let mut form = form();
        form.select_key(TableSide::Source, "qty");
        form.set_table_columns(TableSide::Source, names(&["price", "qty"]));
        assert_eq!(form.key_b.value(), Some("qty"));
        form.set_table_columns(TableSide::Source, names(&["a", "b"]));
        assert_eq!(form.key_b.value(), Some("a"));
    }

    #[test]
    fn test_focus_cycles() {
        let mut form = form();
        assert_eq!(form.focus, FormFocus::PrimaryPath);
        form.handle_key(&key(KeyCode::BackTab));
        assert_eq!(form.focus, FormFocus::ResetButton);
        form.handle_key(&key(KeyCode::Tab));
        assert_eq!(form.focus, FormFocus::PrimaryPath);
    }

    #[test]
    fn test_enter_in_path_field_requests_load() {
        let mut form = form();
        for c in "a.xlsx".chars() {
            form.handle_key(&key(KeyCode::Char(c)));
        }
        assert_eq!(
            form.handle_key(&key(KeyCode::Enter)),
            FormAction::Load(TableSide::Primary, "a.xlsx".to_string())
        );
    }

    #[test]
    fn test_column_list_keys() {
        let mut form = form();
        form.set_focus(FormFocus::Columns);
        form.handle_key(&key(KeyCode::Down));
        form.handle_key(&key(KeyCode::Char(' ')));
        assert_eq!(form.columns.selected(), names(&["price"]).as_slice());
        form.handle_key(&key(KeyCode::Char('a')));
        assert_eq!(form.columns.selected(), names(&["price", "qty"]).as_slice());
        form.handle_key(&key(KeyCode::Char('c')));
        assert!(form.columns.selected().is_empty());
    }

    #[test]
    fn test_buttons() {
        let mut form = form();
        form.set_focus(FormFocus::MergeButton);
        assert_eq!(form.handle_key(&key(KeyCode::Enter)), FormAction::Merge);
        form.set_focus(FormFocus::ResetButton);
        assert_eq!(form.handle_key(&key(KeyCode::Char(' '))), FormAction::Reset);
    }
}
