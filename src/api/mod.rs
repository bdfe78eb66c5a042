//! Access to the external clinic REST API.
//!
//! Screens only ever talk to a [`RecordApi`]; the production implementation
//! is [`http::HttpApi`]. Calls are blocking and are run off the UI loop by
//! [`dispatch::Requests`].

use crate::models::{Record, RecordId};
use thiserror::Error;

pub mod dispatch;
pub mod http;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not reach the API at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Transport(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Short text for the UI. Status errors show only what the server said.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { body, .. } if !body.is_empty() => body.clone(),
            ApiError::Status { status, .. } => format!("Request failed with status {status}"),
            other => other.to_string(),
        }
    }

    /// The server answered 404 for the record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// CRUD endpoints for one record type under `/api/{collection}`.
pub trait RecordApi<R: Record>: Send + Sync {
    fn list(&self) -> Result<Vec<R>, ApiError>;

    fn get(&self, id: RecordId) -> Result<R, ApiError>;

    fn create(&self, fields: &R::Fields) -> Result<(), ApiError>;

    fn update(&self, id: RecordId, fields: &R::Fields) -> Result<(), ApiError>;

    fn delete(&self, id: RecordId) -> Result<(), ApiError>;
}

/// In-memory API used by component tests. Records every call it receives.
#[cfg(test)]
pub mod mock {
    use super::{ApiError, RecordApi};
    use crate::models::{Record, RecordId};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        List,
        Get(RecordId),
        Create(serde_json::Value),
        Update(RecordId, serde_json::Value),
        Delete(RecordId),
    }

    pub struct MockApi<R> {
        records: Mutex<Vec<R>>,
        calls: Mutex<Vec<Call>>,
        fail_with: Mutex<Option<u16>>,
    }

    impl<R: Record> MockApi<R> {
        pub fn new(records: Vec<R>) -> Self {
            Self {
                records: Mutex::new(records),
                calls: Mutex::new(Vec::new()),
                fail_with: Mutex::new(None),
            }
        }

        /// Every following call fails with this HTTP status.
        pub fn failing(self, status: u16) -> Self {
            *self.fail_with.lock().unwrap() = Some(status);
            self
        }

        pub fn set_failing(&self, status: Option<u16>) {
            *self.fail_with.lock().unwrap() = status;
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            match *self.fail_with.lock().unwrap() {
                Some(status) => Err(ApiError::Status {
                    status,
                    body: "Internal Server Error".to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    impl<R: Record + Sync> RecordApi<R> for MockApi<R> {
        fn list(&self) -> Result<Vec<R>, ApiError> {
            self.record(Call::List)?;
            Ok(self.records.lock().unwrap().clone())
        }

        fn get(&self, id: RecordId) -> Result<R, ApiError> {
            self.record(Call::Get(id))?;
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id() == id)
                .cloned()
                .ok_or(ApiError::Status {
                    status: 404,
                    body: String::new(),
                })
        }

        fn create(&self, fields: &R::Fields) -> Result<(), ApiError> {
            self.record(Call::Create(serde_json::to_value(fields).unwrap()))
        }

        fn update(&self, id: RecordId, fields: &R::Fields) -> Result<(), ApiError> {
            self.record(Call::Update(id, serde_json::to_value(fields).unwrap()))
        }

        fn delete(&self, id: RecordId) -> Result<(), ApiError> {
            self.record(Call::Delete(id))?;
            self.records.lock().unwrap().retain(|r| r.id() != id);
            Ok(())
        }
    }
}
