//! Transport seam for the stream consumer
//!
//! The consumer only needs "open this request, give me its body as a byte
//! stream". [`ApiClient`] implements it over reqwest; tests substitute
//! scripted chunk sequences.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tracing::debug;

use super::request::{FormPart, StreamBody, StreamRequest};
use crate::api::ApiClient;
use crate::error::{ApiError, Result};

/// Response body as chunks in arrival order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request. Non-2xx statuses, connect failures and bodiless
    /// responses are errors; otherwise the body stream is returned unread.
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream>;
}

#[async_trait]
impl Transport for ApiClient {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream> {
        let mut builder = self
            .build_request(request.method.clone(), &request.endpoint)?
            .header(ACCEPT, "text/event-stream");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            StreamBody::Empty => builder,
            StreamBody::Json(body) => builder.json(body),
            StreamBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        debug!("Opening stream {} {}", request.method, request.endpoint);
        let response = self.send(builder).await?;
        debug!("Stream opened with status {}", response.status());
        if response.status() == StatusCode::NO_CONTENT {
            return Err(ApiError::NoBody);
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ApiError::Interrupted(e.to_string())));
        Ok(Box::pin(body))
    }
}

fn build_form(parts: &[FormPart]) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                filename,
                mime,
                content,
            } => {
                let file = Part::bytes(content.to_vec())
                    .file_name(filename.clone())
                    .mime_str(mime)
                    .map_err(|e| ApiError::Config(format!("invalid mime type '{}': {}", mime, e)))?;
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}
