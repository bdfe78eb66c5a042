//! Blocking message box. While shown it swallows every key until dismissed.

use crate::components::centered_rect;
use crate::tui::Frame;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

#[derive(Debug, Default)]
pub struct Alert {
    message: Option<String>,
}

impl Alert {
    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn is_open(&self) -> bool {
        self.message.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true when the key was consumed by the alert.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            self.message = None;
        }
        true
    }

    pub fn render(&self, frame: &mut Frame) {
        let Some(message) = self.message() else {
            return;
        };
        let area = centered_rect(frame.area(), 60, 9);
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" ⚠ Error ")
            .title_style(
                Style::default()
                    .fg(Color::Rgb(255, 100, 100))
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(255, 100, 100)))
            .style(Style::default().bg(Color::Rgb(30, 30, 46)));
        frame.render_widget(block.clone(), area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .split(block.inner(area));

        let text = Paragraph::new(message)
            .style(Style::default().fg(Color::Rgb(220, 220, 240)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(text, layout[0]);

        let ok = Paragraph::new("► OK ◄")
            .style(
                Style::default()
                    .fg(Color::Rgb(129, 199, 245))
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center);
        frame.render_widget(ok, layout[1]);
    }
}
