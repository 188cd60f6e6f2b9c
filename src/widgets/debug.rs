use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct DebugState {
    pub num_events: usize,
    pub num_frames: usize,
    pub num_key_events: usize,
    pub last_key_event_name: String,
    /// Last action taken (e.g. "merge", "focus:KeyB") for debugging key handling.
    pub last_action: String,
    pub enabled: bool,
    /// Table cache counters, copied from the session at render time
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl DebugState {
    pub fn on_key(&mut self, event: &crossterm::event::KeyEvent) {
        self.num_key_events += 1;
        self.last_key_event_name = format!("{:?}", event.code);
    }

    pub fn action(&mut self, action: impl Into<String>) {
        self.last_action = action.into();
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(format!(
            "events={} keys={} last_key={} last_action={} frames={} cache={}/{}",
            self.num_events,
            self.num_key_events,
            self.last_key_event_name,
            self.last_action,
            self.num_frames,
            self.cache_hits,
            self.cache_hits + self.cache_misses,
        ))
        .render(area, buf);
    }
}
