use crate::app::SelectedApp;
use crate::components::confirm::{ConfirmDialog, DialogOutcome};
use crate::components::Component;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Padding, Paragraph},
};

const FEATURES: [(&str, &str); 2] = [("🩺", "Doctors"), ("🏥", "Patients")];

const SUBMENUS: [[(&str, SelectedApp); 2]; 2] = [
    [
        ("List Doctors", SelectedApp::DoctorList),
        ("Add Doctor", SelectedApp::DoctorAdd),
    ],
    [
        ("List Patients", SelectedApp::PatientList),
        ("Add Patient", SelectedApp::PatientAdd),
    ],
];

pub struct Home {
    api_url: String,
    /// 0 for the panels, 1 for the Exit button.
    selection_mode: usize,
    active_panel: usize,
    selected_feature_index: usize,
    submenu_states: Vec<ListState>,
    exit_dialog: ConfirmDialog<()>,
}

impl Home {
    pub fn new(api_url: impl Into<String>) -> Self {
        let submenu_states = FEATURES
            .iter()
            .map(|_| ListState::default().with_selected(Some(0)))
            .collect();

        Self {
            api_url: api_url.into(),
            selection_mode: 0,
            active_panel: 0,
            selected_feature_index: 0,
            submenu_states,
            exit_dialog: ConfirmDialog::new("Confirm Exit", "Exit"),
        }
    }

    fn open_exit_dialog(&mut self) {
        self.exit_dialog.open((), "Are you sure you want to exit?");
    }

    fn move_selection(&mut self, forward: bool) {
        if self.selection_mode != 0 {
            return;
        }
        if self.active_panel == 0 {
            let len = FEATURES.len();
            self.selected_feature_index = if forward {
                (self.selected_feature_index + 1) % len
            } else {
                (self.selected_feature_index + len - 1) % len
            };
        } else {
            let len = SUBMENUS[self.selected_feature_index].len();
            let state = &mut self.submenu_states[self.selected_feature_index];
            let i = state.selected().unwrap_or(0);
            state.select(Some(if forward {
                (i + 1) % len
            } else {
                (i + len - 1) % len
            }));
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> Result<Option<SelectedApp>> {
        if self.exit_dialog.is_open() {
            return Ok(match self.exit_dialog.handle_input(key) {
                Some(DialogOutcome::Confirmed(())) => Some(SelectedApp::Quit),
                _ => None,
            });
        }

        match key.code {
            KeyCode::Tab => {
                self.selection_mode = (self.selection_mode + 1) % 2;
            }
            KeyCode::Left => {
                if self.selection_mode == 0 {
                    self.active_panel = 0;
                }
            }
            KeyCode::Right => {
                if self.selection_mode == 0 {
                    self.active_panel = 1;
                }
            }
            KeyCode::Up => self.move_selection(false),
            KeyCode::Down => self.move_selection(true),
            KeyCode::Enter => {
                if self.selection_mode == 1 {
                    self.open_exit_dialog();
                } else if self.active_panel == 1 {
                    let feature = self.selected_feature_index;
                    let option = self.submenu_states[feature].selected().unwrap_or(0);
                    return Ok(SUBMENUS[feature].get(option).map(|(_, app)| *app));
                } else {
                    self.active_panel = 1;
                }
            }
            KeyCode::Esc => {
                if self.active_panel == 1 {
                    self.active_panel = 0;
                } else {
                    self.open_exit_dialog();
                }
            }
            _ => {}
        }

        Ok(None)
    }
}

impl Component for Home {
    fn handle_input(&mut self, event: KeyEvent) -> Result<Option<SelectedApp>> {
        self.handle_input(event)
    }

    fn render(&self, frame: &mut Frame) {
        frame.render_widget(
            Block::default().style(Style::default().bg(Color::Rgb(16, 16, 28))),
            frame.area(),
        );

        let area = frame.area();

        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let welcome_text = vec![
            Line::from(Span::styled(
                "Welcome to Clinic Admin",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled("API: ", Style::default().fg(Color::Rgb(180, 180, 200))),
                Span::styled(
                    self.api_url.as_str(),
                    Style::default()
                        .fg(Color::Rgb(129, 199, 245))
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];

        let welcome_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(75, 75, 120)))
            .style(Style::default().bg(Color::Rgb(24, 24, 40)));

        let welcome_inner = welcome_block.inner(main_layout[0]);
        frame.render_widget(welcome_block, main_layout[0]);

        let welcome_paragraph = Paragraph::new(welcome_text).alignment(Alignment::Center);
        frame.render_widget(welcome_paragraph, welcome_inner);

        let instruction = Paragraph::new("Please select a task:")
            .style(Style::default().fg(Color::Rgb(180, 190, 254)))
            .alignment(Alignment::Center);
        frame.render_widget(instruction, main_layout[1]);

        let content_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .spacing(2)
            .margin(1)
            .split(main_layout[2]);

        let left_panel_style = if self.active_panel == 0 && self.selection_mode == 0 {
            Style::default().fg(Color::Rgb(250, 250, 110))
        } else {
            Style::default().fg(Color::Rgb(140, 140, 200))
        };

        let left_panel_block = Block::default()
            .title(" Clinic Management ")
            .title_style(
                Style::default()
                    .fg(Color::Rgb(230, 230, 250))
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(left_panel_style)
            .style(Style::default().bg(Color::Rgb(22, 22, 35)));

        frame.render_widget(left_panel_block.clone(), content_layout[0]);
        let left_inner = left_panel_block.inner(content_layout[0]);

        let left_padded = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(left_inner);

        let feature_items: Vec<ListItem> = FEATURES
            .iter()
            .enumerate()
            .map(|(idx, (icon, feature))| {
                let selected = idx == self.selected_feature_index;
                let style = if selected {
                    if self.active_panel == 0 && self.selection_mode == 0 {
                        Style::default()
                            .fg(Color::Rgb(250, 250, 110))
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                            .fg(Color::Rgb(140, 219, 140))
                            .add_modifier(Modifier::BOLD)
                    }
                } else {
                    Style::default().fg(Color::Rgb(200, 200, 220))
                };
                let prefix = if selected { " ► " } else { "   " };
                ListItem::new(format!("{prefix}{icon} {feature}")).style(style)
            })
            .collect();

        frame.render_widget(List::new(feature_items), left_padded[1]);

        let right_panel_style = if self.active_panel == 1 && self.selection_mode == 0 {
            Style::default().fg(Color::Rgb(250, 250, 110))
        } else {
            Style::default().fg(Color::Rgb(140, 140, 200))
        };

        let right_panel_block = Block::default()
            .title(" Sub menu ")
            .title_style(
                Style::default()
                    .fg(Color::Rgb(230, 230, 250))
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(right_panel_style)
            .style(Style::default().bg(Color::Rgb(22, 22, 35)));

        frame.render_widget(right_panel_block.clone(), content_layout[1]);
        let right_inner = right_panel_block.inner(content_layout[1]);

        let current_state = &self.submenu_states[self.selected_feature_index];
        let submenu_items: Vec<ListItem> = SUBMENUS[self.selected_feature_index]
            .iter()
            .enumerate()
            .map(|(idx, (option, _))| {
                let selected = current_state.selected() == Some(idx);
                let style = if selected {
                    if self.active_panel == 1 && self.selection_mode == 0 {
                        Style::default()
                            .fg(Color::Rgb(250, 250, 110))
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                            .fg(Color::Rgb(129, 199, 245))
                            .add_modifier(Modifier::BOLD)
                    }
                } else {
                    Style::default().fg(Color::Rgb(200, 200, 220))
                };
                let prefix = if selected { " ► " } else { "   " };
                ListItem::new(format!("{prefix}{option}")).style(style)
            })
            .collect();

        let submenu_list =
            List::new(submenu_items).block(Block::default().padding(Padding::new(2, 0, 2, 0)));
        frame.render_widget(submenu_list, right_inner);

        let help_paragraph = Paragraph::new(
            "←→: Switch panels | ↑↓: Navigate | Enter: Select | Tab: Exit button | Esc: Back",
        )
        .style(Style::default().fg(Color::Rgb(140, 140, 170)))
        .alignment(Alignment::Center);
        frame.render_widget(help_paragraph, main_layout[3]);

        let exit_selected = self.selection_mode == 1;
        let exit_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if exit_selected {
                Style::default().fg(Color::Rgb(255, 100, 100))
            } else {
                Style::default().fg(Color::Rgb(100, 100, 140))
            })
            .style(Style::default().bg(Color::Rgb(26, 26, 36)));
        frame.render_widget(exit_block.clone(), main_layout[4]);

        let exit_paragraph = Paragraph::new(if exit_selected { "[ Exit ]" } else { "  Exit  " })
            .style(if exit_selected {
                Style::default()
                    .fg(Color::Rgb(255, 100, 100))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Rgb(180, 180, 200))
            })
            .alignment(Alignment::Center);
        frame.render_widget(exit_paragraph, exit_block.inner(main_layout[4]));

        self.exit_dialog.render(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(home: &mut Home, code: KeyCode) -> Option<SelectedApp> {
        home.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn submenu_entries_open_their_screens() {
        let mut home = Home::new("http://localhost:5000");
        assert_eq!(press(&mut home, KeyCode::Enter), None);
        assert_eq!(press(&mut home, KeyCode::Enter), Some(SelectedApp::DoctorList));

        press(&mut home, KeyCode::Left);
        press(&mut home, KeyCode::Down);
        press(&mut home, KeyCode::Right);
        press(&mut home, KeyCode::Down);
        assert_eq!(press(&mut home, KeyCode::Enter), Some(SelectedApp::PatientAdd));
    }

    #[test]
    fn exit_needs_confirmation() {
        let mut home = Home::new("http://localhost:5000");
        assert_eq!(press(&mut home, KeyCode::Esc), None);
        assert!(home.exit_dialog.is_open());
        assert_eq!(press(&mut home, KeyCode::Enter), None);
        assert!(!home.exit_dialog.is_open());

        press(&mut home, KeyCode::Tab);
        press(&mut home, KeyCode::Enter);
        assert_eq!(press(&mut home, KeyCode::Char('y')), Some(SelectedApp::Quit));
    }
}
