use crate::app::SelectedApp;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;

pub mod alert;
pub mod confirm;
pub mod home;
pub mod records;

pub trait Component {
    fn handle_input(&mut self, event: KeyEvent) -> Result<Option<SelectedApp>>;
    fn render(&self, frame: &mut Frame);
    /// Called once per event-loop tick when no key arrived.
    fn on_tick(&mut self) {}
}

/// A `width` x `height` rectangle centred in `area`, clipped to it.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
