use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph, Widget},
};

use crate::config::Theme;

/// Key hints shown when focus is on a list or button.
pub const FORM_CONTROLS: [(&str, &str); 7] = [
    ("Tab", "Next"),
    ("m", "Merge"),
    ("s", "Save"),
    ("r", "Reset"),
    ("h", "History"),
    ("?", "Help"),
    ("q", "Quit"),
];

/// Key hints shown while a path field has focus (plain letters are typed).
pub const PATH_CONTROLS: [(&str, &str); 5] = [
    ("Enter", "Load"),
    ("Tab", "Next"),
    ("F5", "Merge"),
    ("Ctrl+S", "Save"),
    ("Esc", "Quit"),
];

/// Bottom bar: key hints on the left, merged row count and a busy spinner on the right.
pub struct Controls {
    pub pairs: Vec<(&'static str, &'static str)>,
    pub row_count: Option<usize>,
    pub bg_color: Color,
    pub key_color: Color,
    pub label_color: Color,
    pub throbber_color: Color,
    pub busy: bool,
    pub throbber_frame: u8,
}

impl Controls {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            pairs: FORM_CONTROLS.to_vec(),
            row_count: None,
            bg_color: theme.get("controls_bg"),
            key_color: theme.get("keybind_hints"),
            label_color: theme.get("keybind_labels"),
            throbber_color: theme.get("throbber"),
            busy: false,
            throbber_frame: 0,
        }
    }

    pub fn with_pairs(mut self, pairs: &[(&'static str, &'static str)]) -> Self {
        self.pairs = pairs.to_vec();
        self
    }

    pub fn with_row_count(mut self, row_count: Option<usize>) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_busy(mut self, busy: bool, throbber_frame: u8) -> Self {
        self.busy = busy;
        self.throbber_frame = throbber_frame;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let no_bg = self.bg_color == Color::Reset;
        let base = if no_bg {
            Style::default()
        } else {
            Style::default().bg(self.bg_color)
        };
        Block::default().style(base).render(area, buf);

        // Pairs never shrink; ones that do not fit are dropped from the right.
        let pair_width = |(key, action): &(&str, &str)| -> u16 {
            (key.chars().count() as u16 + 1) + (action.chars().count() as u16 + 1)
        };
        const THROBBER_WIDTH: u16 = 3;
        const ROW_COUNT_WIDTH: u16 = 20;
        let right_reserved =
            (if self.row_count.is_some() { ROW_COUNT_WIDTH + 1 } else { 1 }) + THROBBER_WIDTH;
        let mut available = area.width.saturating_sub(right_reserved);
        let mut n_show = 0;
        for pair in &self.pairs {
            let need = pair_width(pair);
            if available < need {
                break;
            }
            available -= need;
            n_show += 1;
        }

        let mut constraints: Vec<Constraint> = self
            .pairs
            .iter()
            .take(n_show)
            .flat_map(|(key, action)| {
                [
                    Constraint::Length(key.chars().count() as u16 + 1),
                    Constraint::Length(action.chars().count() as u16 + 1),
                ]
            })
            .collect();
        constraints.push(Constraint::Fill(1));
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(ROW_COUNT_WIDTH));
        }
        constraints.push(Constraint::Length(THROBBER_WIDTH));
        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let key_style = base.fg(self.key_color);
        let label_style = base.fg(self.label_color);
        for (i, (key, action)) in self.pairs.iter().take(n_show).enumerate() {
            Paragraph::new(*key).style(key_style).render(layout[i * 2], buf);
            Paragraph::new(*action)
                .style(label_style)
                .render(layout[i * 2 + 1], buf);
        }

        let fill_idx = n_show * 2;
        if let Some(count) = self.row_count {
            Paragraph::new(format!("Rows: {}", format_number_with_commas(count)))
                .style(label_style)
                .right_aligned()
                .render(layout[fill_idx + 1], buf);
        }

        const THROBBER: [char; 4] = ['|', '/', '-', '\\'];
        let throbber_idx = fill_idx + if self.row_count.is_some() { 2 } else { 1 };
        let throbber = if self.busy {
            THROBBER[self.throbber_frame as usize % THROBBER.len()].to_string()
        } else {
            " ".to_string()
        };
        Paragraph::new(throbber)
            .style(base.fg(self.throbber_color))
            .centered()
            .render(layout[throbber_idx], buf);
    }
}

pub fn format_number_with_commas(n: usize) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_with_commas() {
        assert_eq!(format_number_with_commas(0), "0");
        assert_eq!(format_number_with_commas(999), "999");
        assert_eq!(format_number_with_commas(1000), "1,000");
        assert_eq!(format_number_with_commas(1234567), "1,234,567");
    }

    #[test]
    fn test_render_drops_pairs_that_do_not_fit() {
        let controls = Controls::from_theme(&Theme::default());
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        (&controls).render(area, &mut buf);
        let line: String = (0..area.width).map(|x| buf[(x, 0)].symbol()).collect();
        assert!(line.starts_with("Tab Next"), "got: {line}");
        assert!(!line.contains("Quit"));
    }
}
