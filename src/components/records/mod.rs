//! List and form screens for one record type, switched in place.
//!
//! Only one view exists at a time. Replacing a view drops it, which cancels
//! any request it still had in flight.

pub mod form;
pub mod list;

use crate::api::RecordApi;
use crate::app::SelectedApp;
use crate::components::Component;
use crate::config::AppConfig;
use crate::models::Record;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::KeyEvent;
use form::{FormAction, RecordForm};
use list::{ListAction, RecordList};
use std::sync::Arc;

enum View<R: Record> {
    List(RecordList<R>),
    Form(RecordForm<R>),
}

pub struct RecordsApp<R: Record> {
    api: Arc<dyn RecordApi<R>>,
    config: Arc<AppConfig>,
    view: View<R>,
}

impl<R: Record> RecordsApp<R> {
    /// Starts on the list screen.
    pub fn list(api: Arc<dyn RecordApi<R>>, config: Arc<AppConfig>) -> Self {
        let view = View::List(RecordList::new(Arc::clone(&api), Arc::clone(&config)));
        Self { api, config, view }
    }

    /// Starts on an empty create form.
    pub fn add(api: Arc<dyn RecordApi<R>>, config: Arc<AppConfig>) -> Self {
        let view = View::Form(RecordForm::create(Arc::clone(&api), Arc::clone(&config)));
        Self { api, config, view }
    }

    fn show_list(&mut self, notice: Option<String>) {
        let mut list = RecordList::new(Arc::clone(&self.api), Arc::clone(&self.config));
        if let Some(notice) = notice {
            list.set_notice(notice);
        }
        self.view = View::List(list);
    }

    fn finish_form(&mut self, action: FormAction) {
        match action {
            FormAction::Saved(notice) => self.show_list(Some(notice)),
            FormAction::Cancelled => self.show_list(None),
        }
    }
}

impl<R: Record> Component for RecordsApp<R> {
    fn handle_input(&mut self, key: KeyEvent) -> Result<Option<SelectedApp>> {
        match &mut self.view {
            View::List(list) => match list.handle_input(key)? {
                Some(ListAction::BackToHome) => return Ok(Some(SelectedApp::None)),
                Some(ListAction::Add) => {
                    self.view = View::Form(RecordForm::create(
                        Arc::clone(&self.api),
                        Arc::clone(&self.config),
                    ));
                }
                Some(ListAction::Edit(id)) => {
                    self.view = View::Form(RecordForm::edit(
                        Arc::clone(&self.api),
                        Arc::clone(&self.config),
                        id,
                    ));
                }
                None => {}
            },
            View::Form(form) => {
                if let Some(action) = form.handle_input(key)? {
                    self.finish_form(action);
                }
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        match &self.view {
            View::List(list) => list.render(frame),
            View::Form(form) => form.render(frame),
        }
    }

    fn on_tick(&mut self) {
        match &mut self.view {
            View::List(list) => list.on_tick(),
            View::Form(form) => {
                if let Some(action) = form.on_tick() {
                    self.finish_form(action);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockApi};
    use crate::models::{Doctor, DoctorFields, RecordId};
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::thread;
    use std::time::{Duration, Instant};

    fn press(app: &mut RecordsApp<Doctor>, code: KeyCode) -> Option<SelectedApp> {
        app.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    /// Ticks until `done` holds or two seconds pass.
    fn tick_until(app: &mut RecordsApp<Doctor>, done: impl Fn(&RecordsApp<Doctor>) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !done(&*app) && Instant::now() < deadline {
            app.on_tick();
            thread::sleep(Duration::from_millis(5));
        }
    }

    impl<R: Record> RecordsApp<R> {
        fn is_idle(&self) -> bool {
            match &self.view {
                View::List(list) => !list.is_busy(),
                View::Form(form) => !form.is_busy(),
            }
        }
    }

    fn doctor() -> Doctor {
        Doctor {
            id: RecordId::new(1),
            fields: DoctorFields {
                first_name: "Alice".into(),
                last_name: "Smith".into(),
                email: "alice@clinic.org".into(),
                phone_number: "555-0100".into(),
                category_id: 7,
                bio: String::new(),
            },
        }
    }

    #[test]
    fn edit_round_trip_returns_to_a_refreshed_list() {
        let api = Arc::new(MockApi::new(vec![doctor()]));
        let mut app = RecordsApp::<Doctor>::list(api.clone(), Arc::new(AppConfig::for_tests()));
        tick_until(&mut app, RecordsApp::is_idle);

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.view, View::Form(_)));
        tick_until(&mut app, RecordsApp::is_idle);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        tick_until(&mut app, |app| matches!(app.view, View::List(_)));
        assert!(matches!(app.view, View::List(_)));
        tick_until(&mut app, RecordsApp::is_idle);

        let calls = api.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], Call::List);
        assert_eq!(calls[1], Call::Get(RecordId::new(1)));
        assert!(matches!(calls[2], Call::Update(id, _) if id == RecordId::new(1)));
        assert_eq!(calls[3], Call::List);
    }

    #[test]
    fn back_from_the_list_goes_home_and_form_back_goes_to_list() {
        let api = Arc::new(MockApi::<Doctor>::new(Vec::new()));
        let mut app = RecordsApp::<Doctor>::add(api.clone(), Arc::new(AppConfig::for_tests()));
        assert_eq!(press(&mut app, KeyCode::Esc), None);
        assert!(matches!(app.view, View::List(_)));
        assert_eq!(press(&mut app, KeyCode::Char('b')), Some(SelectedApp::None));
    }
}
