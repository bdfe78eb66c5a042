use super::{ApiError, RecordApi};
use crate::config::ApiConfig;
use crate::models::{Record, RecordId};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Blocking HTTP client for the clinic REST API.
pub struct HttpApi {
    base_url: String,
    client: Client,
    timeout_secs: u64,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn collection_url<R: Record>(&self) -> String {
        format!("{}/api/{}", self.base_url, R::COLLECTION)
    }

    fn record_url<R: Record>(&self, id: RecordId) -> String {
        format!("{}/api/{}/{}", self.base_url, R::COLLECTION, id)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }
        Ok(response)
    }

    fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        self.send(self.client.get(url))?
            .json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_connect() {
            ApiError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ApiError::Timeout(self.timeout_secs)
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// Pulls a human message out of an error body: the `error` or `message`
/// field of a JSON object, else the body text itself.
fn error_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        for key in ["error", "message"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                return text.clone();
            }
        }
    }
    body.trim().to_string()
}

impl<R: Record> RecordApi<R> for HttpApi {
    fn list(&self) -> Result<Vec<R>, ApiError> {
        self.fetch(&self.collection_url::<R>())
    }

    fn get(&self, id: RecordId) -> Result<R, ApiError> {
        self.fetch(&self.record_url::<R>(id))
    }

    fn create(&self, fields: &R::Fields) -> Result<(), ApiError> {
        let url = self.collection_url::<R>();
        tracing::debug!(%url, "POST");
        self.send(self.client.post(&url).json(fields))?;
        Ok(())
    }

    fn update(&self, id: RecordId, fields: &R::Fields) -> Result<(), ApiError> {
        let url = self.record_url::<R>(id);
        tracing::debug!(%url, "PUT");
        self.send(self.client.put(&url).json(fields))?;
        Ok(())
    }

    fn delete(&self, id: RecordId) -> Result<(), ApiError> {
        let url = self.record_url::<R>(id);
        tracing::debug!(%url, "DELETE");
        self.send(self.client.delete(&url))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Doctor, DoctorFields, Patient};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc::{self, Receiver};
    use std::thread;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(&ApiConfig {
            base_url: base.to_string(),
            timeout_secs: 3,
        })
        .unwrap()
    }

    #[test]
    fn urls_are_scoped_by_collection_and_id() {
        let api = api("http://localhost:5000/");
        assert_eq!(api.collection_url::<Doctor>(), "http://localhost:5000/api/doctors");
        assert_eq!(
            api.record_url::<Patient>(RecordId::new(5)),
            "http://localhost:5000/api/patients/5"
        );
    }

    #[test]
    fn error_bodies_prefer_json_fields() {
        assert_eq!(error_message(r#"{"error":"Email taken"}"#), "Email taken");
        assert_eq!(
            error_message(r#"{"message":"Doctor not found or no changes made"}"#),
            "Doctor not found or no changes made"
        );
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"code":7}"#), r#"{"code":7}"#);
    }

    /// What the stub server saw.
    struct Captured {
        request_line: String,
        body: String,
    }

    /// Serves one canned response on a local port and reports the request.
    fn serve_once(status: u16, body: &'static str) -> (String, Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header.trim().is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();

            let _ = tx.send(Captured {
                request_line: request_line.trim_end().to_string(),
                body: String::from_utf8(request_body).unwrap(),
            });
        });
        (base, rx)
    }

    fn captured(rx: &Receiver<Captured>) -> Captured {
        rx.recv_timeout(Duration::from_secs(3)).unwrap()
    }

    fn fields() -> DoctorFields {
        DoctorFields {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "ann@clinic.org".into(),
            phone_number: "555-0199".into(),
            category_id: 8,
            bio: String::new(),
        }
    }

    #[test]
    fn list_decodes_the_collection() {
        let (base, rx) = serve_once(
            200,
            r#"[{"id":"4","firstName":"Ann","lastName":"Lee","email":"ann@clinic.org","phoneNumber":null,"categoryId":8,"bio":null}]"#,
        );
        let doctors = <HttpApi as RecordApi<Doctor>>::list(&api(&base)).unwrap();
        assert_eq!(captured(&rx).request_line, "GET /api/doctors HTTP/1.1");
        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].id, RecordId::new(4));
        assert_eq!(doctors[0].fields.phone_number, "");
    }

    #[test]
    fn client_error_carries_the_error_field() {
        let (base, rx) = serve_once(400, r#"{"error":"Email already in use"}"#);
        let result = <HttpApi as RecordApi<Doctor>>::create(&api(&base), &fields());

        let request = captured(&rx);
        assert_eq!(request.request_line, "POST /api/doctors HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(sent["firstName"], "Ann");
        assert!(sent.get("id").is_none());
        match result {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "Email already in use");
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn server_error_carries_the_message_field() {
        let (base, _rx) = serve_once(500, r#"{"message":"Database unavailable"}"#);
        let result = <HttpApi as RecordApi<Patient>>::list(&api(&base));
        match result {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "Database unavailable");
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn missing_record_on_delete_is_not_found() {
        let (base, rx) = serve_once(404, "Not Found");
        let result = <HttpApi as RecordApi<Doctor>>::delete(&api(&base), RecordId::new(4));
        assert_eq!(captured(&rx).request_line, "DELETE /api/doctors/4 HTTP/1.1");
        let err = result.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Not Found");
    }

    #[test]
    fn update_puts_the_fields_to_the_record_url() {
        let (base, rx) = serve_once(200, r#"{"message":"Doctor updated"}"#);
        <HttpApi as RecordApi<Doctor>>::update(&api(&base), RecordId::new(4), &fields()).unwrap();
        let request = captured(&rx);
        assert_eq!(request.request_line, "PUT /api/doctors/4 HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(sent["categoryId"], 8);
        assert!(sent.get("id").is_none());
    }

    #[test]
    fn malformed_success_bodies_are_decode_errors() {
        let (base, _rx) = serve_once(200, r#"[{"id":1,"firstName":"#);
        let result = <HttpApi as RecordApi<Doctor>>::list(&api(&base));
        assert!(matches!(result, Err(ApiError::Decode(_))), "{result:?}");

        let (base, _rx) = serve_once(200, r#"{"id":1,"firstName":"Ann"}"#);
        let result = <HttpApi as RecordApi<Doctor>>::get(&api(&base), RecordId::new(1));
        assert!(matches!(result, Err(ApiError::Decode(_))), "{result:?}");
    }

    #[test]
    fn unreachable_server_is_a_connection_error() {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let base = format!("http://127.0.0.1:{port}");
        let result = <HttpApi as RecordApi<Doctor>>::list(&api(&base));
        match result {
            Err(ApiError::Connection(url)) => assert_eq!(url, base),
            other => panic!("expected a connection error, got {other:?}"),
        }
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            let held = listener.accept();
            thread::sleep(Duration::from_secs(3));
            drop(held);
        });
        let api = HttpApi::new(&ApiConfig {
            base_url: base,
            timeout_secs: 1,
        })
        .unwrap();
        let result = <HttpApi as RecordApi<Doctor>>::list(&api);
        assert!(matches!(result, Err(ApiError::Timeout(1))), "{result:?}");
    }
}
