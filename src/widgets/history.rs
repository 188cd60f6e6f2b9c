use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Row, Table, Widget},
};

use crate::config::Theme;
use crate::history::HistoryLog;

/// Merge history, newest first.
pub struct HistoryPanel<'a> {
    pub log: &'a HistoryLog,
    pub theme: &'a Theme,
}

impl Widget for HistoryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(["Time", "Primary", "Source", "Columns", "Rows"]).style(
            Style::default()
                .fg(self.theme.get("table_header"))
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = self
            .log
            .list()
            .iter()
            .map(|e| {
                Row::new([
                    e.time_label(),
                    e.primary_name.clone(),
                    e.source_name.clone(),
                    e.selected_count.to_string(),
                    e.row_count.to_string(),
                ])
            })
            .collect();
        let widths = [
            Constraint::Length(19),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(8),
        ];
        Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("History ({})", self.log.len())),
            )
            .render(area, buf);
    }
}
