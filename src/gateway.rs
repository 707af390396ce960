use reqwest::Url;
use reqwest::blocking::multipart::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::models::{Candidate, EntityKind, Employee, FileCategory, User};
use crate::store::Record;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("server returned an empty body")]
    EmptyBody,
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("could not read upload: {0}")]
    Upload(#[from] std::io::Error),
    #[error("invalid request url: {0}")]
    Url(String),
}

// --- Requests ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub path: PathBuf,
    pub category: FileCategory,
    pub entity_kind: Option<EntityKind>,
    pub entity_id: Option<i64>,
}

impl UploadForm {
    fn to_multipart(&self) -> Result<Form, GatewayError> {
        let mut form = Form::new().text("type", self.category.as_str());
        if let Some(kind) = self.entity_kind {
            form = form.text("entity_type", kind.as_str());
        }
        if let Some(id) = self.entity_id {
            form = form.text("entity_id", id.to_string());
        }
        Ok(form.file("file", &self.path)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Upload(UploadForm),
}

/// One call against the backend. Path segments are kept unencoded; the
/// transport is responsible for escaping them.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            body: Body::Empty,
        }
    }

    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self, GatewayError> {
        self.body = Body::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_upload(mut self, form: UploadForm) -> Self {
        self.body = Body::Upload(form);
        self
    }

    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

// --- Transport ---

pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<Option<Value>, GatewayError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API URL '{}' cannot be used as a base URL", config.base_url);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    fn url(&self, segments: &[String]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<Option<Value>, GatewayError> {
        let url = self.url(&request.segments)?;
        debug!(method = ?request.method, path = %request.path(), url = %url, "sending request");

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Upload(form) => builder.multipart(form.to_multipart()?),
        };

        let response = builder.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            let message = error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }
        parse_body(&text)
    }
}

pub fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        for key in ["error", "message"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                return Some(text.to_string());
            }
        }
    }
    Some(trimmed.to_string())
}

pub fn parse_body(body: &str) -> Result<Option<Value>, GatewayError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

// --- Typed gateway ---

pub trait Resource: Record + DeserializeOwned {
    const COLLECTION: &'static [&'static str];
    const NOUN: &'static str;
}

impl Resource for Candidate {
    const COLLECTION: &'static [&'static str] = &["api", "candidates"];
    const NOUN: &'static str = "candidate";
}

impl Resource for Employee {
    const COLLECTION: &'static [&'static str] = &["api", "employees"];
    const NOUN: &'static str = "employee";
}

impl Resource for User {
    const COLLECTION: &'static [&'static str] = &["api", "admin", "users"];
    const NOUN: &'static str = "user";
}

fn item_segments<R: Resource>(id: i64, extra: &[&str]) -> Vec<String> {
    let mut segments: Vec<String> = R::COLLECTION.iter().map(|s| s.to_string()).collect();
    segments.push(id.to_string());
    segments.extend(extra.iter().map(|s| s.to_string()));
    segments
}

pub struct Gateway {
    transport: Box<dyn Transport>,
}

impl Gateway {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn connect(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(Box::new(HttpTransport::new(config)?)))
    }

    pub fn send(&self, request: &ApiRequest) -> Result<Option<Value>, GatewayError> {
        self.transport.send(request)
    }

    pub fn fetch<D: DeserializeOwned>(&self, request: &ApiRequest) -> Result<D, GatewayError> {
        let value = self.send(request)?.ok_or(GatewayError::EmptyBody)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn fetch_optional<D: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Option<D>, GatewayError> {
        match self.send(request)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn list<R: Resource>(&self) -> Result<Vec<R>, GatewayError> {
        self.fetch(&ApiRequest::new(Method::Get, R::COLLECTION))
    }

    pub fn get<R: Resource>(&self, id: i64) -> Result<R, GatewayError> {
        let request = ApiRequest {
            method: Method::Get,
            segments: item_segments::<R>(id, &[]),
            body: Body::Empty,
        };
        self.fetch(&request)
    }

    pub fn create<R: Resource, B: Serialize>(&self, body: &B) -> Result<Option<R>, GatewayError> {
        let request = ApiRequest::new(Method::Post, R::COLLECTION).with_json(body)?;
        self.fetch_optional(&request)
    }

    pub fn update<R: Resource, B: Serialize>(
        &self,
        id: i64,
        body: &B,
    ) -> Result<Option<R>, GatewayError> {
        let request = ApiRequest {
            method: Method::Put,
            segments: item_segments::<R>(id, &[]),
            body: Body::Empty,
        }
        .with_json(body)?;
        self.fetch_optional(&request)
    }

    pub fn delete<R: Resource>(&self, id: i64) -> Result<(), GatewayError> {
        let request = ApiRequest {
            method: Method::Delete,
            segments: item_segments::<R>(id, &[]),
            body: Body::Empty,
        };
        self.send(&request)?;
        Ok(())
    }

    pub fn post_nested<R: Resource, B: Serialize>(
        &self,
        id: i64,
        nested: &[&str],
        body: Option<&B>,
    ) -> Result<Option<Value>, GatewayError> {
        let mut request = ApiRequest {
            method: Method::Post,
            segments: item_segments::<R>(id, nested),
            body: Body::Empty,
        };
        if let Some(body) = body {
            request = request.with_json(body)?;
        }
        self.send(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, candidate_json};
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_json_error_field() {
        assert_eq!(error_message(r#"{"error": "Candidate not found"}"#).as_deref(), Some("Candidate not found"));
        assert_eq!(error_message(r#"{"message": "nope"}"#).as_deref(), Some("nope"));
        assert_eq!(error_message("<html>bad gateway</html>").as_deref(), Some("<html>bad gateway</html>"));
        assert_eq!(error_message("   "), None);
    }

    #[test]
    fn test_parse_body_empty_and_malformed() {
        assert!(parse_body("").unwrap().is_none());
        assert!(parse_body("\n").unwrap().is_none());
        assert!(matches!(parse_body("{not json"), Err(GatewayError::Malformed(_))));
        assert_eq!(parse_body("[1]").unwrap(), Some(json!([1])));
    }

    #[test]
    fn test_list_decodes_collection() {
        let transport = ScriptedTransport::new();
        transport.reply(json!([candidate_json(1, "Ann"), candidate_json(2, "Bo")]));
        let gateway = Gateway::new(Box::new(transport.clone()));

        let candidates: Vec<Candidate> = gateway.list().unwrap();
        assert_eq!(candidates.len(), 2);

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Get);
        assert_eq!(sent[0].path(), "/api/candidates");
    }

    #[test]
    fn test_item_paths() {
        let transport = ScriptedTransport::new();
        transport.reply_empty();
        transport.reply_empty();
        let gateway = Gateway::new(Box::new(transport.clone()));

        gateway.delete::<User>(7).unwrap();
        gateway.post_nested::<Candidate, Value>(3, &["deny"], None).unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].path(), "/api/admin/users/7");
        assert_eq!(sent[0].method, Method::Delete);
        assert_eq!(sent[1].path(), "/api/candidates/3/deny");
        assert_eq!(sent[1].body, Body::Empty);
    }

    #[test]
    fn test_get_requires_a_body() {
        let transport = ScriptedTransport::new();
        transport.reply_empty();
        let gateway = Gateway::new(Box::new(transport));
        assert!(matches!(gateway.get::<Employee>(1), Err(GatewayError::EmptyBody)));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"unexpected": true}));
        let gateway = Gateway::new(Box::new(transport));
        assert!(matches!(gateway.list::<Candidate>(), Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn test_status_error_passes_through() {
        let transport = ScriptedTransport::new();
        transport.fail(403, "Admin access required");
        let gateway = Gateway::new(Box::new(transport));
        let err = gateway.list::<User>().unwrap_err();
        assert_eq!(err.to_string(), "server returned 403: Admin access required");
    }

    #[test]
    fn test_http_transport_escapes_segments_and_keeps_base_path() {
        let config = Config {
            base_url: "https://hr.example.com/backend/".into(),
            token: None,
            timeout_secs: 5,
        };
        let transport = HttpTransport::new(&config).unwrap();
        let url = transport
            .url(&["api".into(), "files".into(), "delete".into(), "resumes".into(), "my cv#1.pdf".into()])
            .unwrap();
        assert_eq!(url.as_str(), "https://hr.example.com/backend/api/files/delete/resumes/my%20cv%231.pdf");
    }

    #[test]
    fn test_http_transport_rejects_non_base_url() {
        let config = Config {
            base_url: "mailto:hr@example.com".into(),
            token: None,
            timeout_secs: 5,
        };
        assert!(HttpTransport::new(&config).is_err());
    }

    #[test]
    #[ignore] // Needs network access to the hosted backend
    fn test_live_backend_rejects_missing_token() {
        let config = Config {
            base_url: crate::config::DEFAULT_API_URL.into(),
            token: None,
            timeout_secs: 60,
        };
        let gateway = Gateway::connect(&config).unwrap();
        match gateway.list::<User>() {
            Err(GatewayError::Status { status, .. }) => assert!(status == 401 || status == 403),
            other => panic!("expected an auth failure, got {:?}", other.map(|users| users.len())),
        }
    }
}
