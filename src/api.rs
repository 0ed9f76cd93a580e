/// Backend API client
///
/// The language implementation runs in an external HTTP service. This module
/// defines the `Backend` seam the session talks to and a blocking `ureq`
/// implementation of it. Calls are plain request/response: no retry, no
/// timeout, no cancellation.
use log::debug;
use serde_json::{Value, json};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

const USER_AGENT: &str = concat!("cherry-ide/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status
    #[error("HTTP {status}: {text}")]
    Status { status: u16, text: String },

    /// The backend could not be reached
    #[error("{0}")]
    Transport(String),

    /// The body was not valid JSON
    #[error("invalid response body: {0}")]
    Body(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Operations offered by the backend
pub trait Backend {
    fn status(&self) -> Result<Value, ApiError>;
    fn execute(&self, code: &str, file_name: &str) -> Result<Value, ApiError>;
    fn save_file(&self, file_name: &str, content: &str) -> Result<Value, ApiError>;
    fn open_file(&self, file_name: &str) -> Result<Value, ApiError>;
    fn create_file(&self, file_name: &str, content: &str) -> Result<Value, ApiError>;
    fn list_files(&self) -> Result<Value, ApiError>;
    fn delete_file(&self, file_name: &str) -> Result<Value, ApiError>;
    fn reports(&self) -> Result<Value, ApiError>;
}

/// `Backend` over HTTP
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        debug!("GET {}", endpoint);
        let mut request = self.agent.get(&self.url(endpoint));
        for (key, value) in query {
            request = request.query(key, value);
        }
        read_json(request.call())
    }

    fn post(&self, endpoint: &str, body: Value) -> Result<Value, ApiError> {
        debug!("POST {}", endpoint);
        let request = self.agent.post(&self.url(endpoint)).set("Content-Type", "application/json");
        read_json(request.send_json(body))
    }

    fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        debug!("DELETE {}", endpoint);
        read_json(self.agent.delete(&self.url(endpoint)).call())
    }
}

fn read_json(result: Result<ureq::Response, ureq::Error>) -> Result<Value, ApiError> {
    match result {
        Ok(response) => response.into_json::<Value>().map_err(|e| ApiError::Body(e.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            Err(ApiError::Status { status, text: response.status_text().to_string() })
        }
        Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport(transport.to_string())),
    }
}

impl Backend for HttpBackend {
    fn status(&self) -> Result<Value, ApiError> {
        self.get("/status", &[])
    }

    fn execute(&self, code: &str, file_name: &str) -> Result<Value, ApiError> {
        self.post("/execute", json!({ "code": code, "fileName": file_name }))
    }

    fn save_file(&self, file_name: &str, content: &str) -> Result<Value, ApiError> {
        self.post("/files/save", json!({ "fileName": file_name, "content": content }))
    }

    fn open_file(&self, file_name: &str) -> Result<Value, ApiError> {
        self.get("/files/open", &[("fileName", file_name)])
    }

    fn create_file(&self, file_name: &str, content: &str) -> Result<Value, ApiError> {
        self.post("/files/create", json!({ "fileName": file_name, "content": content }))
    }

    fn list_files(&self) -> Result<Value, ApiError> {
        self.get("/files", &[])
    }

    fn delete_file(&self, file_name: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/files/{}", encode_path_segment(file_name)))
    }

    fn reports(&self) -> Result<Value, ApiError> {
        self.get("/reports", &[])
    }
}

/// A file known to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    pub name: String,
    pub size: Option<u64>,
    pub modified: Option<String>,
}

/// Read the `/files` listing. Accepts a bare array or `{"files": [...]}`;
/// entries may be plain names or objects.
pub fn file_descriptors(listing: &Value) -> Vec<FileDescriptor> {
    let items = listing.as_array().or_else(|| listing.get("files").and_then(Value::as_array));

    items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(FileDescriptor { name: name.clone(), size: None, modified: None }),
                    Value::Object(obj) => {
                        let name = ["name", "fileName"].iter().find_map(|k| obj.get(*k).and_then(Value::as_str))?;
                        Some(FileDescriptor {
                            name: name.to_string(),
                            size: obj.get("size").and_then(Value::as_u64),
                            modified: ["modified", "lastModified"]
                                .iter()
                                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                                .map(str::to_string),
                        })
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Text content of an `/files/open` response
pub fn file_content(response: &Value) -> Option<String> {
    match response {
        Value::String(s) => Some(s.clone()),
        other => other.get("content").and_then(Value::as_str).map(str::to_string),
    }
}

/// Percent-encode a single path segment (same unreserved set as
/// `encodeURIComponent`)
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
