use polars::prelude::{AnyValue, DataFrame};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};
use std::borrow::Cow;

use crate::config::Theme;

/// First `max_rows` rows of the merge result. Null cells render blank.
pub struct Preview<'a> {
    pub frame: Option<&'a DataFrame>,
    pub max_rows: usize,
    pub theme: &'a Theme,
}

/// Cell text for row `row` of every column, in column order.
pub fn row_strings(df: &DataFrame, row: usize) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| {
            let value = df
                .column(name.as_str())
                .ok()
                .and_then(|c| c.get(row).ok());
            let text: Cow<str> = match value {
                None | Some(AnyValue::Null) => Cow::Borrowed(""),
                Some(v) => v.str_value(),
            };
            text.into_owned()
        })
        .collect()
}

impl Widget for Preview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL);
        let Some(df) = self.frame else {
            Table::new(
                vec![Row::new(vec![Cell::from("Run a merge to see the result")])
                    .style(Style::default().fg(self.theme.get("dimmed")))],
                [Constraint::Fill(1)],
            )
            .block(block.title("Preview"))
            .render(area, buf);
            return;
        };

        let shown = df.height().min(self.max_rows);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        let rows: Vec<Vec<String>> = (0..shown).map(|i| row_strings(df, i)).collect();

        let widths: Vec<Constraint> = names
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let widest = rows
                    .iter()
                    .map(|r| r[c].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0);
                Constraint::Length(widest.min(u16::MAX as usize) as u16)
            })
            .collect();

        let header_bg = self.theme.get("table_header_bg");
        let header_style = if header_bg == Color::Reset {
            Style::default().fg(self.theme.get("table_header"))
        } else {
            Style::default()
                .bg(header_bg)
                .fg(self.theme.get("table_header"))
        };
        let header = Row::new(names.into_iter().map(Cell::from)).style(header_style);
        let body = rows
            .into_iter()
            .map(|r| Row::new(r.into_iter().map(|s| Cell::from(Line::from(s)))));

        let title = format!("Preview ({} of {} rows)", shown, df.height());
        Table::new(body, widths)
            .header(header)
            .column_spacing(2)
            .block(block.title(title))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_row_strings_blank_for_null() {
        let df = df!(
            "id" => ["1", "2"],
            "qty" => [Some(5i64), None],
        )
        .unwrap();
        assert_eq!(row_strings(&df, 0), vec!["1", "5"]);
        assert_eq!(row_strings(&df, 1), vec!["2", ""]);
    }

    #[test]
    fn test_title_counts_rows() {
        let theme = Theme::default();
        let df = df!("id" => ["1", "2", "3"]).unwrap();
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        Preview {
            frame: Some(&df),
            max_rows: 2,
            theme: &theme,
        }
        .render(area, &mut buf);
        let top: String = (0..area.width).map(|x| buf[(x, 0)].symbol()).collect();
        assert!(top.contains("Preview (2 of 3 rows)"), "{top}");
    }
}
