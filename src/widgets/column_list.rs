//! List panels for the key pickers and the source-column chooser.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::config::Theme;
use crate::merge_form::{ColumnChooser, KeyPicker};

fn border_style(focused: bool, active: Color) -> Style {
    if focused {
        Style::default().fg(active)
    } else {
        Style::default()
    }
}

/// "reversed" (or any reset color) highlights by swapping fg and bg.
fn selected_style(color: Color) -> Style {
    if color == Color::Reset {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().bg(color)
    }
}

fn render_list(
    items: Vec<ListItem<'_>>,
    title: &str,
    focused: bool,
    highlighted: Option<usize>,
    theme: &Theme,
    area: Rect,
    buf: &mut Buffer,
) {
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(border_style(focused, theme.get("modal_border_active"))),
        )
        .highlight_style(selected_style(theme.get("table_selected")));
    let mut state = ListState::default().with_selected(highlighted);
    StatefulWidget::render(list, area, buf, &mut state);
}

/// Single-choice column list. The chosen column is highlighted.
pub struct KeyList<'a> {
    pub picker: &'a KeyPicker,
    pub title: &'a str,
    pub focused: bool,
    pub theme: &'a Theme,
}

impl Widget for KeyList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let items: Vec<ListItem> = if self.picker.options().is_empty() {
            vec![ListItem::new("(no workbook loaded)")
                .style(Style::default().fg(self.theme.get("dimmed")))]
        } else {
            self.picker
                .options()
                .iter()
                .map(|name| ListItem::new(name.as_str()))
                .collect()
        };
        render_list(
            items,
            self.title,
            self.focused,
            self.picker.selected_index(),
            self.theme,
            area,
            buf,
        );
    }
}

/// Multi-select list of source columns. Selected rows show their output position.
pub struct ColumnList<'a> {
    pub chooser: &'a ColumnChooser,
    pub focused: bool,
    pub theme: &'a Theme,
}

impl Widget for ColumnList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let selected_style = Style::default().fg(self.theme.get("column_selected"));
        let items: Vec<ListItem> = self
            .chooser
            .candidates()
            .iter()
            .map(|name| match self.chooser.order_of(name) {
                Some(n) => ListItem::new(format!("[{n}] {name}")).style(selected_style),
                None => ListItem::new(format!("[ ] {name}")),
            })
            .collect();
        let title = format!(
            "Columns to copy ({}/{})",
            self.chooser.selected().len(),
            self.chooser.candidates().len()
        );
        render_list(
            items,
            &title,
            self.focused,
            self.focused.then_some(self.chooser.cursor()),
            self.theme,
            area,
            buf,
        );
    }
}
