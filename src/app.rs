//! Top-level application state for the clinic console.
//!
//! The app is either on the home menu or running one records workspace
//! (doctors or patients). Leaving a workspace drops it together with any
//! request it still had in flight.

use crate::api::RecordApi;
use crate::components::records::RecordsApp;
use crate::components::{home::Home, Component};
use crate::config::AppConfig;
use crate::models::{Doctor, Patient};
use crate::tui::{self, Tui};
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;

/// Screens reachable from the home menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedApp {
    DoctorList,
    DoctorAdd,
    PatientList,
    PatientAdd,
    /// Back to the home menu.
    None,
    Quit,
}

pub enum AppState {
    Home,
    Running(Workspace),
}

pub enum Workspace {
    Doctors(RecordsApp<Doctor>),
    Patients(RecordsApp<Patient>),
}

impl Workspace {
    fn component(&mut self) -> &mut dyn Component {
        match self {
            Workspace::Doctors(app) => app,
            Workspace::Patients(app) => app,
        }
    }

    fn view(&self) -> &dyn Component {
        match self {
            Workspace::Doctors(app) => app,
            Workspace::Patients(app) => app,
        }
    }
}

pub struct App {
    pub state: AppState,
    pub should_quit: bool,
    pub home: Home,
    config: Arc<AppConfig>,
    doctors: Arc<dyn RecordApi<Doctor>>,
    patients: Arc<dyn RecordApi<Patient>>,
}

impl App {
    pub fn new(
        config: Arc<AppConfig>,
        doctors: Arc<dyn RecordApi<Doctor>>,
        patients: Arc<dyn RecordApi<Patient>>,
    ) -> Self {
        Self {
            state: AppState::Home,
            should_quit: false,
            home: Home::new(config.api.base_url.clone()),
            config,
            doctors,
            patients,
        }
    }

    /// Draws, then waits for the next key or tick, until asked to quit.
    pub fn run(&mut self, tui: &mut Tui) -> Result<()> {
        while !self.should_quit {
            tui.draw(|frame| self.render_ui(frame))?;
            match tui.next_event()? {
                tui::Event::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    self.handle_key(key)?;
                }
                tui::Event::Input(_) => {}
                tui::Event::Tick => self.on_tick(),
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Global keybinding: Ctrl+Q to quit
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            tracing::info!("Quit requested");
            self.should_quit = true;
            return Ok(());
        }

        let selected = match &mut self.state {
            AppState::Home => self.home.handle_input(key)?,
            AppState::Running(workspace) => workspace.component().handle_input(key)?,
        };
        if let Some(selected) = selected {
            self.open(selected);
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        if let AppState::Running(workspace) = &mut self.state {
            workspace.component().on_tick();
        }
    }

    /// Switches to `selected`, dropping whatever workspace was running.
    pub fn open(&mut self, selected: SelectedApp) {
        let config = Arc::clone(&self.config);
        self.state = match selected {
            SelectedApp::DoctorList => AppState::Running(Workspace::Doctors(RecordsApp::list(
                Arc::clone(&self.doctors),
                config,
            ))),
            SelectedApp::DoctorAdd => AppState::Running(Workspace::Doctors(RecordsApp::add(
                Arc::clone(&self.doctors),
                config,
            ))),
            SelectedApp::PatientList => AppState::Running(Workspace::Patients(
                RecordsApp::list(Arc::clone(&self.patients), config),
            )),
            SelectedApp::PatientAdd => AppState::Running(Workspace::Patients(RecordsApp::add(
                Arc::clone(&self.patients),
                config,
            ))),
            SelectedApp::None => AppState::Home,
            SelectedApp::Quit => {
                self.should_quit = true;
                return;
            }
        };
        tracing::debug!("Switched to {:?}", selected);
    }

    fn render_ui(&self, frame: &mut tui::Frame<'_>) {
        match &self.state {
            AppState::Home => self.home.render(frame),
            AppState::Running(workspace) => workspace.view().render(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;

    fn app() -> App {
        App::new(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MockApi::<Doctor>::new(Vec::new())),
            Arc::new(MockApi::<Patient>::new(Vec::new())),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn opening_and_leaving_a_workspace() {
        let mut app = app();
        app.open(SelectedApp::PatientList);
        assert!(matches!(
            app.state,
            AppState::Running(Workspace::Patients(_))
        ));

        app.handle_key(key(KeyCode::Char('b'))).unwrap();
        assert!(matches!(app.state, AppState::Home));
        assert!(!app.should_quit);
    }

    #[test]
    fn ctrl_q_quits_from_anywhere() {
        let mut app = app();
        app.open(SelectedApp::DoctorAdd);
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(app.should_quit);
    }
}
