//! Table of every record of one type, with local search and delete.

use crate::api::dispatch::Requests;
use crate::api::{ApiError, RecordApi};
use crate::components::confirm::{ConfirmDialog, DialogOutcome};
use crate::config::AppConfig;
use crate::models::{filter_indices, Record, RecordId};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What the list asks its owner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    BackToHome,
    Add,
    Edit(RecordId),
}

enum ListMsg<R> {
    Loaded(Result<Vec<R>, ApiError>),
    Deleted(RecordId, Result<(), ApiError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

pub struct RecordList<R: Record> {
    api: Arc<dyn RecordApi<R>>,
    config: Arc<AppConfig>,
    records: Vec<R>,
    /// Indices into `records` that pass the search, in fetch order.
    visible: Vec<usize>,
    search: String,
    searching: bool,
    table_state: TableState,
    load: LoadState,
    show_details: bool,
    confirm: ConfirmDialog<RecordId>,
    failed_delete: Option<RecordId>,
    /// Confirmed while another request was running; sent once it finishes.
    queued_delete: Option<RecordId>,
    error_message: Option<String>,
    notice: Option<String>,
    notice_timer: Option<Instant>,
    requests: Requests<ListMsg<R>>,
}

impl<R: Record> RecordList<R> {
    /// Mounts the list and starts the collection fetch.
    pub fn new(api: Arc<dyn RecordApi<R>>, config: Arc<AppConfig>) -> Self {
        let mut list = Self {
            api,
            config,
            records: Vec::new(),
            visible: Vec::new(),
            search: String::new(),
            searching: false,
            table_state: TableState::default(),
            load: LoadState::Loading,
            show_details: false,
            confirm: ConfirmDialog::new("Confirm Delete", "Delete"),
            failed_delete: None,
            queued_delete: None,
            error_message: None,
            notice: None,
            notice_timer: None,
            requests: Requests::new(),
        };
        list.fetch();
        list
    }

    /// Shows a short-lived message, e.g. after returning from a saved form.
    pub fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
        self.notice_timer = Some(Instant::now());
    }

    fn fetch(&mut self) {
        if self.requests.is_busy() {
            return;
        }
        self.load = LoadState::Loading;
        let api = Arc::clone(&self.api);
        if let Err(e) = self
            .requests
            .spawn(R::COLLECTION, move || ListMsg::Loaded(api.list()))
        {
            self.load = LoadState::Failed(format!("Could not start the request: {e}"));
        }
    }

    fn delete(&mut self, id: RecordId) {
        if self.requests.is_busy() {
            self.queued_delete = Some(id);
            self.set_notice(format!(
                "Deleting {} #{} once the current request finishes...",
                R::SINGULAR,
                id
            ));
            return;
        }
        self.error_message = None;
        let api = Arc::clone(&self.api);
        if let Err(e) = self
            .requests
            .spawn(R::SINGULAR, move || ListMsg::Deleted(id, api.delete(id)))
        {
            self.failed_delete = Some(id);
            self.error_message = Some(format!(
                "Failed to delete {} #{}: could not start the request ({e}). Press R to retry or Esc to dismiss.",
                R::SINGULAR,
                id
            ));
        }
    }

    /// Applies finished requests, then sends a delete that was waiting on them.
    fn apply_all(&mut self, messages: Vec<ListMsg<R>>) {
        for message in messages {
            self.apply(message);
        }
        if !self.requests.is_busy() {
            if let Some(id) = self.queued_delete.take() {
                self.delete(id);
            }
        }
    }

    fn apply(&mut self, message: ListMsg<R>) {
        match message {
            ListMsg::Loaded(Ok(records)) => {
                tracing::info!("Loaded {} {}", records.len(), R::COLLECTION);
                self.records = records;
                self.load = LoadState::Ready;
                self.refilter();
            }
            ListMsg::Loaded(Err(e)) => {
                tracing::warn!("Failed to fetch {}: {}", R::COLLECTION, e);
                self.load = LoadState::Failed(e.user_message());
            }
            ListMsg::Deleted(id, Ok(())) => {
                tracing::info!("Deleted {} {}", R::SINGULAR, id);
                self.records.retain(|r| r.id() != id);
                self.failed_delete = None;
                self.refilter();
                self.set_notice(format!("{} deleted.", capitalize(R::SINGULAR)));
            }
            ListMsg::Deleted(id, Err(e)) if e.is_not_found() => {
                tracing::info!("{} {} was already gone", R::SINGULAR, id);
                self.records.retain(|r| r.id() != id);
                self.failed_delete = None;
                self.refilter();
                self.set_notice(format!(
                    "{} #{} no longer exists.",
                    capitalize(R::SINGULAR),
                    id
                ));
            }
            ListMsg::Deleted(id, Err(e)) => {
                tracing::warn!("Failed to delete {} {}: {}", R::SINGULAR, id, e);
                self.failed_delete = Some(id);
                self.error_message = Some(format!(
                    "Failed to delete {} #{}: {}. Press R to retry or Esc to dismiss.",
                    R::SINGULAR,
                    id,
                    e.user_message()
                ));
            }
        }
    }

    /// Recomputes the visible rows and keeps the selection in range.
    fn refilter(&mut self) {
        self.visible = filter_indices(&self.records, &self.search);
        if self.visible.is_empty() {
            self.table_state.select(None);
            self.show_details = false;
        } else {
            let selection = self
                .table_state
                .selected()
                .unwrap_or(0)
                .min(self.visible.len() - 1);
            self.table_state.select(Some(selection));
        }
    }

    fn select_next(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    fn select_previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    fn selected_record(&self) -> Option<&R> {
        self.table_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .and_then(|&index| self.records.get(index))
    }

    #[cfg(test)]
    pub(crate) fn is_busy(&self) -> bool {
        self.requests.is_busy()
    }

    pub fn on_tick(&mut self) {
        let messages = self.requests.poll();
        self.apply_all(messages);
        if let Some(timer) = self.notice_timer {
            if timer.elapsed() > Duration::from_secs(5) {
                self.notice = None;
                self.notice_timer = None;
            }
        }
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.search.push(c),
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Enter => self.searching = false,
            KeyCode::Esc => {
                self.search.clear();
                self.searching = false;
            }
            _ => return,
        }
        self.refilter();
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> Result<Option<ListAction>> {
        if self.confirm.is_open() {
            if let Some(DialogOutcome::Confirmed(id)) = self.confirm.handle_input(key) {
                self.delete(id);
            }
            return Ok(None);
        }

        if self.searching {
            self.handle_search_input(key);
            return Ok(None);
        }

        match key.code {
            KeyCode::Down => self.select_next(),
            KeyCode::Up => self.select_previous(),
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('a') | KeyCode::Char('A') => return Ok(Some(ListAction::Add)),
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(record) = self.selected_record() {
                    return Ok(Some(ListAction::Edit(record.id())));
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                if let Some(id) = self.selected_record().map(|r| r.id()) {
                    self.confirm.open(
                        id,
                        format!("Are you sure you want to delete this {}?", R::SINGULAR),
                    );
                }
            }
            KeyCode::Char('v') | KeyCode::Char('V') | KeyCode::Char(' ') => {
                if self.selected_record().is_some() {
                    self.show_details = !self.show_details;
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => match self.failed_delete {
                Some(id) => self.delete(id),
                None => self.fetch(),
            },
            KeyCode::Char('b') | KeyCode::Char('B') => return Ok(Some(ListAction::BackToHome)),
            KeyCode::Esc => {
                if self.show_details {
                    self.show_details = false;
                } else if self.failed_delete.is_some() {
                    self.failed_delete = None;
                    self.error_message = None;
                } else if !self.search.is_empty() {
                    self.search.clear();
                    self.refilter();
                } else {
                    return Ok(Some(ListAction::BackToHome));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(
            Block::default().style(Style::default().bg(Color::Rgb(16, 16, 28))),
            area,
        );

        let detail_height = if self.show_details {
            R::COLUMNS.len() as u16 + 2
        } else {
            1
        };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),             // Header
                Constraint::Length(3),             // Search
                Constraint::Min(8),                // Table
                Constraint::Length(detail_height), // Details or help
                Constraint::Length(1),             // Status
            ])
            .margin(1)
            .split(area);

        let header_block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::Rgb(75, 75, 120)))
            .style(Style::default().bg(Color::Rgb(16, 16, 28)));
        frame.render_widget(header_block, layout[0]);

        let title = Paragraph::new(R::TITLE)
            .style(
                Style::default()
                    .fg(Color::Rgb(230, 230, 250))
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::Rgb(16, 16, 28)),
            )
            .alignment(Alignment::Center);
        frame.render_widget(title, layout[0]);

        self.render_search(frame, layout[1]);

        match &self.load {
            LoadState::Failed(reason) => self.render_load_error(frame, layout[2], reason),
            LoadState::Loading if self.records.is_empty() => {
                let loading = Paragraph::new(format!("Loading {}...", R::COLLECTION))
                    .style(Style::default().fg(Color::Rgb(180, 180, 200)))
                    .alignment(Alignment::Center)
                    .block(table_block());
                frame.render_widget(loading, layout[2]);
            }
            _ => self.render_table(frame, layout[2]),
        }

        match self.selected_record() {
            Some(record) if self.show_details => {
                let lines: Vec<Line> = record
                    .details(self.config.specialties)
                    .into_iter()
                    .map(|(label, value)| {
                        Line::from(vec![
                            Span::styled(
                                format!("{label}: "),
                                Style::default().fg(Color::Rgb(250, 250, 110)),
                            ),
                            Span::raw(value),
                        ])
                    })
                    .collect();
                let details = Paragraph::new(lines)
                    .style(Style::default().fg(Color::Rgb(200, 200, 220)))
                    .block(
                        Block::default()
                            .title(format!(" {} ", record.display_name()))
                            .borders(Borders::ALL)
                            .border_type(BorderType::Rounded)
                            .border_style(Style::default().fg(Color::Rgb(75, 75, 120))),
                    )
                    .wrap(Wrap { trim: true });
                frame.render_widget(details, layout[3]);
            }
            _ => {
                let help = Paragraph::new(
                    "↑↓: Navigate | /: Search | A: Add | Enter/E: Edit | D: Delete | V: Details | R: Refresh | Esc: Back",
                )
                .style(Style::default().fg(Color::Rgb(140, 140, 170)))
                .alignment(Alignment::Center);
                frame.render_widget(help, layout[3]);
            }
        }

        if let Some(error) = &self.error_message {
            let error_paragraph = Paragraph::new(error.as_str())
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center);
            frame.render_widget(error_paragraph, layout[4]);
        } else if let Some(notice) = &self.notice {
            let notice_paragraph = Paragraph::new(format!("✓ {notice}"))
                .style(
                    Style::default()
                        .fg(Color::Rgb(140, 219, 140))
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(Alignment::Center);
            frame.render_widget(notice_paragraph, layout[4]);
        }

        self.confirm.render(frame);
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let placeholder = self.search.is_empty() && !self.searching;
        let text = if placeholder {
            format!("Search {}... (press /)", R::COLLECTION)
        } else {
            self.search.clone()
        };
        let search = Paragraph::new(text)
            .style(if placeholder {
                Style::default().fg(Color::Rgb(120, 120, 150))
            } else {
                Style::default().fg(Color::Rgb(220, 220, 240))
            })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(" 🔍 Search ")
                    .border_style(if self.searching {
                        Style::default().fg(Color::Rgb(250, 250, 110))
                    } else {
                        Style::default().fg(Color::Rgb(140, 140, 200))
                    })
                    .style(Style::default().bg(Color::Rgb(26, 26, 36))),
            );
        frame.render_widget(search, area);
    }

    fn render_load_error(&self, frame: &mut Frame, area: Rect, reason: &str) {
        let text = vec![
            Line::from(Span::styled(
                format!("Failed to load {}. Please try again later.", R::COLLECTION),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                reason.to_string(),
                Style::default().fg(Color::Rgb(200, 200, 220)),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "► Press R to retry ◄",
                Style::default()
                    .fg(Color::Rgb(129, 199, 245))
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        let panel = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(table_block());
        frame.render_widget(panel, area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let header_cells = R::COLUMNS
            .iter()
            .map(|c| Cell::from(c.title).style(Style::default().fg(Color::Rgb(230, 230, 250))));
        let header = Row::new(header_cells)
            .style(Style::default().bg(Color::Rgb(26, 26, 36)))
            .height(1)
            .bottom_margin(1);

        let mut rows: Vec<Row> = self
            .visible
            .iter()
            .filter_map(|&index| self.records.get(index))
            .map(|record| Row::new(record.cells(self.config.specialties)).height(1))
            .collect();

        if rows.is_empty() {
            rows.push(Row::new(vec![
                Cell::from(""),
                Cell::from(format!("No {} found", R::COLLECTION))
                    .style(Style::default().fg(Color::Rgb(180, 180, 200))),
            ]));
        }

        let widths: Vec<Constraint> = R::COLUMNS
            .iter()
            .map(|c| Constraint::Percentage(c.width))
            .collect();

        let table = Table::new(rows, widths)
            .header(header)
            .block(table_block())
            .row_highlight_style(
                Style::default()
                    .bg(Color::Rgb(40, 40, 65))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("► ");

        frame.render_stateful_widget(table, area, &mut self.table_state.clone());
    }
}

fn table_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(75, 75, 120)))
        .style(Style::default().bg(Color::Rgb(22, 22, 35)))
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
