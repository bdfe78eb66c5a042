//! Create and edit form shared by every record type.

use crate::api::dispatch::Requests;
use crate::api::{ApiError, RecordApi};
use crate::components::alert::Alert;
use crate::components::records::list::capitalize;
use crate::config::AppConfig;
use crate::models::{specialty, Draft, FieldKind, Record, RecordId};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// The record was stored. Carries the notice for the list.
    Saved(String),
    Cancelled,
}

enum FormMsg<R> {
    Loaded(Result<R, ApiError>),
    Saved(Result<(), ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Edit(RecordId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadState {
    Ready,
    Loading,
    Failed(String),
}

pub struct RecordForm<R: Record> {
    api: Arc<dyn RecordApi<R>>,
    config: Arc<AppConfig>,
    mode: Mode,
    load: LoadState,
    draft: Draft,
    focus_index: usize,
    saving: bool,
    error_message: Option<String>,
    error_timer: Option<Instant>,
    alert: Alert,
    requests: Requests<FormMsg<R>>,
}

impl<R: Record> RecordForm<R> {
    pub fn create(api: Arc<dyn RecordApi<R>>, config: Arc<AppConfig>) -> Self {
        let draft = R::empty_draft(config.specialties);
        Self::with_mode(api, config, Mode::Create, draft, LoadState::Ready)
    }

    /// Opens the form for an existing record and fetches its current values.
    pub fn edit(api: Arc<dyn RecordApi<R>>, config: Arc<AppConfig>, id: RecordId) -> Self {
        let draft = R::empty_draft(config.specialties);
        let mut form = Self::with_mode(api, config, Mode::Edit(id), draft, LoadState::Loading);
        form.fetch();
        form
    }

    fn with_mode(
        api: Arc<dyn RecordApi<R>>,
        config: Arc<AppConfig>,
        mode: Mode,
        draft: Draft,
        load: LoadState,
    ) -> Self {
        Self {
            api,
            config,
            mode,
            load,
            draft,
            focus_index: 0,
            saving: false,
            error_message: None,
            error_timer: None,
            alert: Alert::default(),
            requests: Requests::new(),
        }
    }

    fn submit_index() -> usize {
        R::FORM.len()
    }

    fn back_index() -> usize {
        R::FORM.len() + 1
    }

    fn focus_count() -> usize {
        R::FORM.len() + 2
    }

    fn fetch(&mut self) {
        let Mode::Edit(id) = self.mode else {
            return;
        };
        if self.requests.is_busy() {
            return;
        }
        self.load = LoadState::Loading;
        let api = Arc::clone(&self.api);
        if let Err(e) = self
            .requests
            .spawn(R::SINGULAR, move || FormMsg::Loaded(api.get(id)))
        {
            self.load = LoadState::Failed(format!("Could not start the request: {e}"));
        }
    }

    fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
        self.error_timer = Some(Instant::now());
    }

    fn clear_error(&mut self) {
        self.error_message = None;
        self.error_timer = None;
    }

    fn submit(&mut self) {
        if self.saving {
            return;
        }
        let fields = match R::parse_draft(&self.draft, self.config.specialties) {
            Ok(fields) => fields,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };
        self.clear_error();
        self.saving = true;

        let api = Arc::clone(&self.api);
        let mode = self.mode;
        let spawned = self.requests.spawn(R::SINGULAR, move || {
            FormMsg::Saved(match mode {
                Mode::Create => api.create(&fields),
                Mode::Edit(id) => api.update(id, &fields),
            })
        });
        if let Err(e) = spawned {
            self.saving = false;
            self.alert_save_failure(&format!("could not start the request ({e})"));
        }
    }

    fn alert_save_failure(&mut self, reason: &str) {
        let verb = match self.mode {
            Mode::Create => "add",
            Mode::Edit(_) => "update",
        };
        self.alert
            .show(format!("Failed to {verb} {}: {reason}", R::SINGULAR));
    }

    fn apply(&mut self, message: FormMsg<R>) -> Option<FormAction> {
        match message {
            FormMsg::Loaded(Ok(record)) => {
                self.draft = record.to_draft();
                self.load = LoadState::Ready;
            }
            FormMsg::Loaded(Err(e)) => {
                tracing::warn!("Failed to fetch {}: {}", R::SINGULAR, e);
                self.load = LoadState::Failed(e.user_message());
            }
            FormMsg::Saved(Ok(())) => {
                self.saving = false;
                let notice = match self.mode {
                    Mode::Create => {
                        tracing::info!("Created {}", R::SINGULAR);
                        format!("{} added successfully!", capitalize(R::SINGULAR))
                    }
                    Mode::Edit(id) => {
                        tracing::info!("Updated {} {}", R::SINGULAR, id);
                        format!("{} updated successfully!", capitalize(R::SINGULAR))
                    }
                };
                return Some(FormAction::Saved(notice));
            }
            FormMsg::Saved(Err(e)) => {
                self.saving = false;
                tracing::warn!("Failed to save {}: {}", R::SINGULAR, e);
                self.alert_save_failure(&e.user_message());
            }
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn is_busy(&self) -> bool {
        self.requests.is_busy()
    }

    pub fn on_tick(&mut self) -> Option<FormAction> {
        if let Some(timer) = self.error_timer {
            if timer.elapsed() > Duration::from_secs(5) {
                self.clear_error();
            }
        }
        let mut action = None;
        for message in self.requests.poll() {
            if let Some(next) = self.apply(message) {
                action = Some(next);
            }
        }
        action
    }

    fn focused_kind(&self) -> Option<FieldKind> {
        R::FORM.get(self.focus_index).map(|spec| spec.kind)
    }

    fn cycle_specialty(&mut self, step: isize) {
        let current = self.draft.text(self.focus_index).parse().unwrap_or(0);
        if let Some(next) = specialty::cycle(self.config.specialties, current, step) {
            self.draft.set(self.focus_index, next.id.to_string());
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> Result<Option<FormAction>> {
        if self.alert.handle_input(key) {
            return Ok(None);
        }

        match self.load {
            LoadState::Ready => {}
            LoadState::Loading => {
                if key.code == KeyCode::Esc {
                    return Ok(Some(FormAction::Cancelled));
                }
                return Ok(None);
            }
            LoadState::Failed(_) => {
                match key.code {
                    KeyCode::Char('r') | KeyCode::Char('R') => self.fetch(),
                    KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('B') => {
                        return Ok(Some(FormAction::Cancelled))
                    }
                    _ => {}
                }
                return Ok(None);
            }
        }

        if self.saving {
            if key.code == KeyCode::Esc {
                return Ok(Some(FormAction::Cancelled));
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Char(c) => match self.focused_kind() {
                Some(FieldKind::Specialty) => {
                    if c == ' ' {
                        self.cycle_specialty(1);
                    }
                }
                Some(_) => {
                    self.draft.push_char(self.focus_index, c);
                    self.clear_error();
                }
                None => {}
            },
            KeyCode::Backspace => {
                if !matches!(self.focused_kind(), None | Some(FieldKind::Specialty)) {
                    self.draft.pop_char(self.focus_index);
                    self.clear_error();
                }
            }
            KeyCode::Left if self.focused_kind() == Some(FieldKind::Specialty) => {
                self.cycle_specialty(-1);
            }
            KeyCode::Right if self.focused_kind() == Some(FieldKind::Specialty) => {
                self.cycle_specialty(1);
            }
            KeyCode::Tab => {
                self.focus_index = if self.focus_index < Self::submit_index() {
                    Self::submit_index()
                } else if self.focus_index == Self::submit_index() {
                    Self::back_index()
                } else {
                    0
                };
            }
            KeyCode::Down => {
                self.focus_index = (self.focus_index + 1) % Self::focus_count();
            }
            KeyCode::Up => {
                self.focus_index =
                    (self.focus_index + Self::focus_count() - 1) % Self::focus_count();
            }
            KeyCode::Esc => return Ok(Some(FormAction::Cancelled)),
            KeyCode::Enter => {
                if self.focus_index == Self::back_index() {
                    return Ok(Some(FormAction::Cancelled));
                } else if self.focus_index == Self::submit_index() {
                    self.submit();
                } else {
                    self.focus_index += 1;
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn title(&self) -> String {
        match self.mode {
            Mode::Create => format!("➕ NEW {}", R::SINGULAR.to_uppercase()),
            Mode::Edit(id) => format!("✎ EDIT {} #{}", R::SINGULAR.to_uppercase(), id),
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(
            Block::default().style(Style::default().bg(Color::Rgb(16, 16, 28))),
            area,
        );

        let main_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(10),   // Fields
                Constraint::Length(1), // Buttons
                Constraint::Length(1), // Status
                Constraint::Length(1), // Help
            ])
            .margin(1)
            .split(area);

        let header = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Rgb(75, 75, 120)))
            .style(Style::default().bg(Color::Rgb(16, 16, 28)));
        frame.render_widget(header, main_layout[0]);

        let title = Paragraph::new(self.title())
            .style(
                Style::default()
                    .fg(Color::Rgb(230, 230, 250))
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::Rgb(16, 16, 28)),
            )
            .alignment(Alignment::Center);
        frame.render_widget(title, main_layout[0]);

        let body_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(75, 75, 120)))
            .style(Style::default().bg(Color::Rgb(22, 22, 35)));
        frame.render_widget(body_block.clone(), main_layout[1]);
        let body_inner = body_block.inner(main_layout[1]);

        match &self.load {
            LoadState::Loading => {
                let loading = Paragraph::new(format!("Loading {}...", R::SINGULAR))
                    .style(Style::default().fg(Color::Rgb(180, 180, 200)))
                    .alignment(Alignment::Center);
                frame.render_widget(loading, body_inner);
            }
            LoadState::Failed(reason) => {
                let text = vec![
                    Line::from(Span::styled(
                        format!("Could not load this {}.", R::SINGULAR),
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(reason.as_str()),
                    Line::from(""),
                    Line::from(Span::styled(
                        "► Press R to retry ◄",
                        Style::default()
                            .fg(Color::Rgb(129, 199, 245))
                            .add_modifier(Modifier::BOLD),
                    )),
                ];
                frame.render_widget(
                    Paragraph::new(text)
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true }),
                    body_inner,
                );
            }
            LoadState::Ready => self.render_fields(frame, body_inner),
        }

        self.render_buttons(frame, main_layout[2]);

        if let Some(error) = &self.error_message {
            let error_paragraph = Paragraph::new(error.as_str())
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center);
            frame.render_widget(error_paragraph, main_layout[3]);
        }

        let help = Paragraph::new(
            "↑↓: Move | Tab: Submit/Back | ←→/Space: Change specialty | Enter: Next/Activate | Esc: Back",
        )
        .style(Style::default().fg(Color::Rgb(140, 140, 170)))
        .alignment(Alignment::Center);
        frame.render_widget(help, main_layout[4]);

        self.alert.render(frame);
    }

    fn render_fields(&self, frame: &mut Frame, area: Rect) {
        let constraints: Vec<Constraint> = R::FORM
            .iter()
            .map(|spec| match spec.kind {
                FieldKind::Multiline => Constraint::Length(5),
                _ => Constraint::Length(3),
            })
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .horizontal_margin(2)
            .split(area);

        let required_style = Style::default().fg(Color::Rgb(230, 230, 250));
        let optional_style = Style::default().fg(Color::Rgb(170, 170, 190));

        for (index, spec) in R::FORM.iter().enumerate() {
            let focused = self.focus_index == index;
            let value = self.draft.get(index);
            let text = match spec.kind {
                FieldKind::Specialty => {
                    let name = value
                        .trim()
                        .parse()
                        .ok()
                        .and_then(|id| specialty::find(self.config.specialties, id))
                        .map(|s| s.name)
                        .unwrap_or(specialty::FALLBACK_SPECIALTY);
                    format!("◄ {name} ►")
                }
                FieldKind::Date if value.is_empty() && !focused => "YYYY-MM-DD".to_string(),
                _ => value.to_string(),
            };
            let (label, label_style) = if spec.required {
                (format!(" {}* ", spec.label), required_style)
            } else {
                (format!(" {} ", spec.label), optional_style)
            };

            let input = Paragraph::new(text)
                .style(
                    Style::default()
                        .fg(Color::Rgb(220, 220, 240))
                        .bg(Color::Rgb(26, 26, 36)),
                )
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .title(Span::styled(label, label_style))
                        .border_style(if focused {
                            Style::default().fg(Color::Rgb(250, 250, 110))
                        } else {
                            Style::default().fg(Color::Rgb(140, 140, 200))
                        })
                        .style(Style::default().bg(Color::Rgb(26, 26, 36))),
                );
            if let Some(row) = rows.get(index) {
                frame.render_widget(input, *row);
            }
        }
    }

    fn render_buttons(&self, frame: &mut Frame, area: Rect) {
        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let button = |label: &str, selected: bool, color: Color| {
            Paragraph::new(if selected {
                format!("► {label} ◄")
            } else {
                format!("  {label}  ")
            })
            .style(if selected {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Rgb(180, 180, 200))
            })
            .alignment(Alignment::Center)
        };

        let submit_label = match self.mode {
            _ if self.saving => "Saving...",
            Mode::Create => "Submit",
            Mode::Edit(_) => "Update",
        };
        frame.render_widget(
            button(
                submit_label,
                self.focus_index == Self::submit_index(),
                Color::Rgb(140, 219, 140),
            ),
            buttons[0],
        );
        frame.render_widget(
            button(
                "Back",
                self.focus_index == Self::back_index(),
                Color::Rgb(129, 199, 245),
            ),
            buttons[1],
        );
    }
}
