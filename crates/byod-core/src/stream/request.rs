//! Description of a streamed request, independent of the HTTP client

use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;

/// Body of a streamed request
#[derive(Debug, Clone, PartialEq)]
pub enum StreamBody {
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// One multipart form field
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        mime: String,
        content: Bytes,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// File field; mime type guessed from the filename
    pub fn file(name: impl Into<String>, filename: impl Into<String>, content: Bytes) -> Self {
        let filename = filename.into();
        let mime = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        FormPart::File {
            name: name.into(),
            filename,
            mime,
            content,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// Endpoint, method, headers and body for one streamed operation
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub method: Method,
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub body: StreamBody,
}

impl StreamRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            headers: Vec::new(),
            body: StreamBody::Empty,
        }
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = StreamBody::Json(body);
        self
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = StreamBody::Multipart(parts);
        self
    }
}
