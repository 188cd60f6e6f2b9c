use chrono::NaiveDateTime;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod config;
pub mod error;
pub mod error_display;
pub mod export;
pub mod history;
pub mod loader;
pub mod logging;
pub mod merge;
pub mod merge_form;
pub mod session;
pub mod widgets;

pub use cache::TableCache;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme, APP_NAME,
};
pub use error::{SheetMergeError, SheetMergeResult, TableSide};
pub use export::{ExportOptions, XLSX_MIME};
pub use history::{HistoryEntry, HistoryLog};
pub use loader::LoadedTable;
pub use merge::{merge, DuplicateKeyPolicy, JoinConfig, MergeOptions};
pub use session::{MergeResult, Session};
pub use sheetmerge_cli::Args;

use error_display::user_message;
use merge_form::{FormAction, FormFocus, MergeForm};
use widgets::column_list::{ColumnList, KeyList};
use widgets::controls::{Controls, FORM_CONTROLS, PATH_CONTROLS};
use widgets::debug::DebugState;
use widgets::history::HistoryPanel;
use widgets::preview::Preview;

pub enum AppEvent {
    Key(KeyEvent),
    Load(TableSide, PathBuf),
    DoLoad(TableSide, PathBuf), // Internal event to read the workbook after the busy indicator renders
    Merge,
    DoMerge,
    Save,
    DoSave,
    Reset,
    Resize(u16, u16), // resized (width, height)
    Exit,
    Crash(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// One-line message under the form: the outcome of the last action.
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub message: String,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            kind: StatusKind::Info,
            message: "Enter the path of the primary workbook and press Enter".to_string(),
        }
    }
}

const HELP_TEXT: &str = "\
Tab / Shift+Tab   move between fields
Enter             load the workbook in a path field, or press a button
Up / Down         choose a key column, move in the column list
Space             select or deselect a source column (order is kept)
a / c             select all / clear selection
m or F5           merge
s or Ctrl+S       save the merged workbook
r or Ctrl+R       reset the session
h                 show or hide the history
q, Esc, Ctrl+C    quit

Every row of the primary workbook is kept. Keys are compared as trimmed text.";

pub struct App {
    events: Sender<AppEvent>,
    session: Session,
    pub form: MergeForm,
    config: AppConfig,
    theme: Theme,
    debug: DebugState,
    status: StatusLine,
    show_history: bool,
    show_help: bool,
    busy: bool,
    throbber_frame: u8,
    output_dir: PathBuf,
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        Self::new_with_config(events, Theme::default(), AppConfig::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, theme: Theme, config: AppConfig) -> App {
        let session = Session::new(config.merge_options(), config.export_options());
        App {
            events,
            session,
            form: MergeForm::new(&theme),
            show_history: config.display.show_history,
            output_dir: config.output_dir(),
            debug: DebugState {
                enabled: config.debug.enabled,
                ..DebugState::default()
            },
            config,
            theme,
            status: StatusLine::default(),
            show_help: false,
            busy: false,
            throbber_frame: 0,
        }
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn set_output_dir(&mut self, dir: PathBuf) {
        self.output_dir = dir;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn history_visible(&self) -> bool {
        self.show_history
    }

    pub fn help_visible(&self) -> bool {
        self.show_help
    }

    fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.status = StatusLine {
            kind,
            message: message.into(),
        };
    }

    fn report(&mut self, err: &SheetMergeError) {
        let kind = if err.is_warning() {
            StatusKind::Warning
        } else {
            StatusKind::Error
        };
        tracing::warn!(error = %err, "action failed");
        self.set_status(kind, user_message(err));
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        if self.show_help {
            if matches!(
                event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Enter
            ) {
                self.show_help = false;
            }
            return None;
        }

        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char('c') if ctrl => return Some(AppEvent::Exit),
            KeyCode::Char('s') if ctrl => return Some(AppEvent::Save),
            KeyCode::Char('r') if ctrl => return Some(AppEvent::Reset),
            KeyCode::F(5) => return Some(AppEvent::Merge),
            _ => {}
        }

        if !self.form.focus.is_text_input() {
            match event.code {
                KeyCode::Char('q') | KeyCode::Esc => return Some(AppEvent::Exit),
                KeyCode::Char('m') => return Some(AppEvent::Merge),
                KeyCode::Char('s') => return Some(AppEvent::Save),
                KeyCode::Char('r') => return Some(AppEvent::Reset),
                KeyCode::Char('h') => {
                    self.show_history = !self.show_history;
                    return None;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                    return None;
                }
                _ => {}
            }
        }

        match self.form.handle_key(event) {
            FormAction::None => {
                self.debug.action(format!("focus:{:?}", self.form.focus));
                None
            }
            FormAction::Load(side, path) => Some(AppEvent::Load(side, PathBuf::from(path))),
            FormAction::Merge => Some(AppEvent::Merge),
            FormAction::Save => Some(AppEvent::Save),
            FormAction::Reset => Some(AppEvent::Reset),
            FormAction::Cancel => Some(AppEvent::Exit),
        }
    }

    fn load(&mut self, side: TableSide, path: &Path) {
        match self.session.load_path(side, path) {
            Ok(table) => {
                let message = format!(
                    "Loaded {} ({} rows, {} columns) as the {} workbook",
                    table.name,
                    table.height(),
                    table.frame.width(),
                    side
                );
                let columns = table.column_names();
                self.form.set_table_columns(side, columns);
                self.form
                    .path_input(side)
                    .set_value(path.display().to_string());
                if side == TableSide::Primary && self.form.focus == FormFocus::PrimaryPath {
                    self.form.set_focus(FormFocus::SourcePath);
                } else if side == TableSide::Source && self.form.focus == FormFocus::SourcePath {
                    self.form.set_focus(FormFocus::KeyA);
                }
                self.set_status(StatusKind::Success, message);
            }
            Err(e) => self.report(&e),
        }
    }

    fn run_merge(&mut self) {
        let config = self.form.join_config();
        match self.session.run_merge(&config, now()) {
            Ok(result) => {
                let message = format!(
                    "Merge complete: {} rows, {} columns. Press s to save.",
                    result.frame.height(),
                    result.frame.width()
                );
                self.set_status(StatusKind::Success, message);
            }
            Err(e) => self.report(&e),
        }
    }

    fn save(&mut self) {
        let dir = self.output_dir.clone();
        match self.session.export_result(&dir, now()) {
            Ok(path) => self.set_status(StatusKind::Success, format!("Saved {}", path.display())),
            Err(e) => self.report(&e),
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Load(side, path) => {
                self.debug.action(format!("load:{}", side));
                self.busy = true;
                self.set_status(StatusKind::Info, format!("Loading {}...", path.display()));
                Some(AppEvent::DoLoad(*side, path.clone()))
            }
            AppEvent::DoLoad(side, path) => {
                self.load(*side, path);
                self.busy = false;
                None
            }
            AppEvent::Merge => {
                self.debug.action("merge");
                self.busy = true;
                self.set_status(StatusKind::Info, "Merging...");
                Some(AppEvent::DoMerge)
            }
            AppEvent::DoMerge => {
                self.run_merge();
                self.busy = false;
                None
            }
            AppEvent::Save => {
                self.debug.action("save");
                self.busy = true;
                self.set_status(StatusKind::Info, "Saving...");
                Some(AppEvent::DoSave)
            }
            AppEvent::DoSave => {
                self.save();
                self.busy = false;
                None
            }
            AppEvent::Reset => {
                self.debug.action("reset");
                self.session.reset();
                self.form.reset();
                self.set_status(StatusKind::Info, "Session reset");
                None
            }
            AppEvent::Resize(_, _) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn status_color(&self) -> Color {
        match self.status.kind {
            StatusKind::Info => self.theme.get("text_secondary"),
            StatusKind::Success => self.theme.get("success"),
            StatusKind::Warning => self.theme.get("warning"),
            StatusKind::Error => self.theme.get("error"),
        }
    }

    fn render_path_input(&self, side: TableSide, area: Rect, buf: &mut Buffer) {
        let (input, focus) = match side {
            TableSide::Primary => (&self.form.primary_path, FormFocus::PrimaryPath),
            TableSide::Source => (&self.form.source_path, FormFocus::SourcePath),
        };
        let title = match self.session.table(side) {
            Some(t) => format!("{} workbook: {} ({} rows)", side, t.name, t.height()),
            None => format!("{} workbook", side),
        };
        let border = if self.form.focus == focus {
            Style::default().fg(self.theme.get("modal_border_active"))
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border);
        let inner = block.inner(area);
        block.render(area, buf);
        input.render(inner, buf);
    }

    fn render_button(&self, label: &str, focus: FormFocus, enabled: bool, area: Rect, buf: &mut Buffer) {
        let mut style = if self.form.focus == focus {
            Style::default().fg(self.theme.get("modal_border_active"))
        } else {
            Style::default()
        };
        if !enabled {
            style = style.fg(self.theme.get("dimmed"));
        }
        Paragraph::new(label)
            .style(style)
            .centered()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(style),
            )
            .render(area, buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(area, 80, 60);
        Clear.render(popup, buf);
        Paragraph::new(HELP_TEXT)
            .style(Style::default().fg(self.theme.get("text_primary")))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title("Help")
                    .border_style(Style::default().fg(self.theme.get("modal_border_active"))),
            )
            .render(popup, buf);
    }
}

/// `percent_x` by `percent_y` rectangle centered in `area`.
fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Fill(1),
        ])
        .split(vertical[1])[1]
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let preview_height = self.config.display.preview_rows.min(50) as u16 + 3;
        let history_height = if self.show_history {
            self.session.history().len().clamp(1, 5) as u16 + 3
        } else {
            0
        };
        let mut constraints = vec![
            Constraint::Length(3),    // path inputs
            Constraint::Min(5),       // key pickers and column chooser
            Constraint::Length(3),    // buttons
            Constraint::Length(1),    // status
            Constraint::Length(preview_height),
            Constraint::Length(history_height),
            Constraint::Length(1),    // controls
        ];
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::new(Direction::Vertical, constraints).split(area);

        let paths = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[0]);
        self.render_path_input(TableSide::Primary, paths[0], buf);
        self.render_path_input(TableSide::Source, paths[1], buf);

        let lists = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(50),
            ])
            .split(layout[1]);
        KeyList {
            picker: &self.form.key_a,
            title: "Key (primary)",
            focused: self.form.focus == FormFocus::KeyA,
            theme: &self.theme,
        }
        .render(lists[0], buf);
        KeyList {
            picker: &self.form.key_b,
            title: "Key (source)",
            focused: self.form.focus == FormFocus::KeyB,
            theme: &self.theme,
        }
        .render(lists[1], buf);
        ColumnList {
            chooser: &self.form.columns,
            focused: self.form.focus == FormFocus::Columns,
            theme: &self.theme,
        }
        .render(lists[2], buf);

        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(12),
                Constraint::Length(2),
                Constraint::Length(12),
                Constraint::Length(2),
                Constraint::Length(12),
                Constraint::Fill(1),
            ])
            .split(layout[2]);
        let can_merge = self.form.can_merge();
        let can_save = self.session.result().is_some();
        self.render_button("Merge", FormFocus::MergeButton, can_merge, buttons[1], buf);
        self.render_button("Save", FormFocus::SaveButton, can_save, buttons[3], buf);
        self.render_button("Reset", FormFocus::ResetButton, true, buttons[5], buf);

        Paragraph::new(self.status.message.as_str())
            .style(
                Style::default()
                    .fg(self.status_color())
                    .add_modifier(Modifier::BOLD),
            )
            .render(layout[3], buf);

        Preview {
            frame: self.session.result().map(|r| &r.frame),
            max_rows: self.config.display.preview_rows,
            theme: &self.theme,
        }
        .render(layout[4], buf);

        if self.show_history {
            HistoryPanel {
                log: self.session.history(),
                theme: &self.theme,
            }
            .render(layout[5], buf);
        }

        if self.busy {
            self.throbber_frame = self.throbber_frame.wrapping_add(1);
        }
        let pairs: &[(&str, &str)] = if self.form.focus.is_text_input() {
            &PATH_CONTROLS
        } else {
            &FORM_CONTROLS
        };
        let controls = Controls::from_theme(&self.theme)
            .with_pairs(pairs)
            .with_row_count(self.session.result().map(|r| r.frame.height()))
            .with_busy(self.busy, self.throbber_frame);
        (&controls).render(layout[6], buf);

        if self.debug.enabled {
            self.debug.cache_hits = self.session.cache().hits();
            self.debug.cache_misses = self.session.cache().misses();
            (&self.debug).render(layout[7], buf);
        }

        if self.show_help {
            self.render_help(area, buf);
        }
    }
}

/// Run the TUI. Paths given on the command line are loaded before the first key press.
pub fn run(
    primary: Option<PathBuf>,
    source: Option<PathBuf>,
    config: AppConfig,
    debug: bool,
) -> Result<()> {
    use std::sync::mpsc;

    let theme = Theme::from_config(&config.theme)
        .or_else(|e| Theme::from_config(&AppConfig::default().theme).map_err(|_| e))?;

    let mut terminal = ratatui::try_init().map_err(|e| {
        color_eyre::eyre::eyre!(
            "sheetmerge requires an interactive terminal (TTY). No terminal detected: {}. \
             Use --key-a, --key-b and --columns to merge without the UI.",
            e
        )
    })?;
    let (tx, rx) = mpsc::channel::<AppEvent>();
    let poll_interval = config.performance.event_poll_interval_ms;
    let mut app = App::new_with_config(tx.clone(), theme, config);
    if debug {
        app.enable_debug();
    }

    terminal.draw(|frame| frame.render_widget(&mut app, frame.area()))?;

    if let Some(path) = primary {
        tx.send(AppEvent::Load(TableSide::Primary, path))?;
    }
    if let Some(path) = source {
        tx.send(AppEvent::Load(TableSide::Source, path))?;
    }

    loop {
        if crossterm::event::poll(std::time::Duration::from_millis(poll_interval))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => {
                    if key.is_press() {
                        tx.send(AppEvent::Key(key))?
                    }
                }
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        ratatui::restore();
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(next) = app.event(&event) {
                            tx.send(next)?;
                        }
                    }
                }
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => false,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            terminal.draw(|frame| frame.render_widget(&mut app, frame.area()))?;
        }
    }

    ratatui::restore();
    Ok(())
}
