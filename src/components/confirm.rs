//! Yes/no modal that gates one pending action.
//!
//! The action is parked inside the dialog when it opens and handed back only
//! through [`DialogOutcome::Confirmed`]. Closing the dialog any other way
//! drops it, so a destructive action cannot run without an explicit confirm.

use crate::components::centered_rect;
use crate::tui::Frame;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

const CONFIRM_BUTTON: usize = 0;
const CANCEL_BUTTON: usize = 1;

#[derive(Debug, PartialEq, Eq)]
pub enum DialogOutcome<A> {
    Confirmed(A),
    Cancelled,
}

pub struct ConfirmDialog<A> {
    title: &'static str,
    confirm_label: &'static str,
    message: String,
    pending: Option<A>,
    selected: usize,
}

impl<A> ConfirmDialog<A> {
    pub fn new(title: &'static str, confirm_label: &'static str) -> Self {
        Self {
            title,
            confirm_label,
            message: String::new(),
            pending: None,
            selected: CANCEL_BUTTON,
        }
    }

    /// Opens the dialog for `action`, replacing anything already pending.
    pub fn open(&mut self, action: A, message: impl Into<String>) {
        self.pending = Some(action);
        self.message = message.into();
        // Default to the safe choice.
        self.selected = CANCEL_BUTTON;
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes a key while open. Returns `None` while the dialog stays open
    /// (or was never open).
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<DialogOutcome<A>> {
        if !self.is_open() {
            return None;
        }
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.selected = 1 - self.selected;
                None
            }
            KeyCode::Enter if self.selected == CONFIRM_BUTTON => self.confirm(),
            KeyCode::Enter => self.cancel(),
            KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.cancel(),
            _ => None,
        }
    }

    fn confirm(&mut self) -> Option<DialogOutcome<A>> {
        self.pending.take().map(DialogOutcome::Confirmed)
    }

    fn cancel(&mut self) -> Option<DialogOutcome<A>> {
        self.pending = None;
        Some(DialogOutcome::Cancelled)
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.is_open() {
            return;
        }
        let dialog_area = centered_rect(frame.area(), 52, 9);
        frame.render_widget(Clear, dialog_area);

        let dialog_block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(Color::Rgb(230, 230, 250))
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(140, 140, 200)))
            .style(Style::default().bg(Color::Rgb(30, 30, 46)));

        frame.render_widget(dialog_block.clone(), dialog_area);

        let inner_area = dialog_block.inner(dialog_area);
        let content_layout = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .split(inner_area);

        let message = Paragraph::new(self.message.as_str())
            .style(
                Style::default()
                    .fg(Color::Rgb(220, 220, 240))
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, content_layout[0]);

        let buttons_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(content_layout[1]);

        let cancel_selected = self.selected == CANCEL_BUTTON;
        let cancel_button = Paragraph::new(if cancel_selected {
            "► Cancel ◄"
        } else {
            "  Cancel  "
        })
        .style(if cancel_selected {
            Style::default()
                .fg(Color::Rgb(129, 199, 245))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Rgb(180, 180, 200))
        })
        .alignment(Alignment::Center);

        let confirm_text = if cancel_selected {
            format!("  {}  ", self.confirm_label)
        } else {
            format!("► {} ◄", self.confirm_label)
        };
        let confirm_button = Paragraph::new(confirm_text)
            .style(if cancel_selected {
                Style::default().fg(Color::Rgb(180, 180, 200))
            } else {
                Style::default()
                    .fg(Color::Rgb(255, 100, 100))
                    .add_modifier(Modifier::BOLD)
            })
            .alignment(Alignment::Center);

        frame.render_widget(cancel_button, buttons_layout[0]);
        frame.render_widget(confirm_button, buttons_layout[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn opened() -> ConfirmDialog<u32> {
        let mut dialog = ConfirmDialog::new("Delete", "Delete");
        dialog.open(7, "Are you sure you want to delete this doctor?");
        dialog
    }

    #[test]
    fn escape_cancels_and_drops_the_action() {
        let mut dialog = opened();
        assert_eq!(dialog.handle_input(key(KeyCode::Esc)), Some(DialogOutcome::Cancelled));
        assert!(!dialog.is_open());
        // Nothing left to confirm afterwards.
        assert_eq!(dialog.handle_input(key(KeyCode::Char('y'))), None);
    }

    #[test]
    fn enter_defaults_to_cancel() {
        let mut dialog = opened();
        assert_eq!(
            dialog.handle_input(key(KeyCode::Enter)),
            Some(DialogOutcome::Cancelled)
        );
    }

    #[test]
    fn confirm_button_returns_the_action() {
        let mut dialog = opened();
        assert_eq!(dialog.handle_input(key(KeyCode::Left)), None);
        assert_eq!(
            dialog.handle_input(key(KeyCode::Enter)),
            Some(DialogOutcome::Confirmed(7))
        );
        assert!(!dialog.is_open());
    }

    #[test]
    fn other_keys_keep_the_dialog_open() {
        let mut dialog = opened();
        assert_eq!(dialog.handle_input(key(KeyCode::Char('x'))), None);
        assert_eq!(dialog.handle_input(key(KeyCode::Down)), None);
        assert!(dialog.is_open());
        assert_eq!(
            dialog.handle_input(key(KeyCode::Char('y'))),
            Some(DialogOutcome::Confirmed(7))
        );
    }

    #[test]
    fn reopening_resets_selection_to_cancel() {
        let mut dialog = opened();
        dialog.handle_input(key(KeyCode::Right));
        dialog.open(8, "again");
        assert_eq!(
            dialog.handle_input(key(KeyCode::Enter)),
            Some(DialogOutcome::Cancelled)
        );
    }
}
