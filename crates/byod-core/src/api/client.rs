//! HTTP request helper for the dashboard API
//!
//! Every JSON call goes through [`ApiClient::send`], which turns transport
//! failures and non-2xx responses into [`ApiError`]s.

use bytes::Bytes;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::DashboardConfig;
use crate::error::{ApiError, Result};

const USER_AGENT: &str = concat!("byod-ui/", env!("CARGO_PKG_VERSION"));

/// Client for the local dashboard server
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl ApiClient {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let mut base_url = config.parsed_base_url()?;
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            api_key: config.api_key.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint such as `/api/jobs` against the base URL
    pub fn url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| ApiError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))
    }

    /// Request builder with auth applied; no timeout so streams stay open
    pub(crate) fn build_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        let mut request = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        Ok(request)
    }

    /// Send a request and reject non-2xx responses
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout_secs))?;
        self.handle_error_response(response).await
    }

    /// Pass 2xx responses through, convert everything else to an error
    pub async fn handle_error_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(status, &body);
        warn!("API error {}: {}", status.as_u16(), detail);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth {
                status: status.as_u16(),
                detail,
            });
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    /// JSON request with optional query string and body
    pub async fn request_json<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!("{} {}", method, endpoint);
        let mut request = self
            .build_request(method, endpoint)?
            .timeout(std::time::Duration::from_secs(self.timeout_secs));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout_secs))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request_json::<T, Value>(Method::GET, endpoint, &[], None)
            .await
    }

    pub async fn post_json<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(Method::POST, endpoint, &[], Some(body))
            .await
    }

    /// Raw body download (result files)
    pub async fn get_bytes(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Bytes> {
        let request = self
            .build_request(Method::GET, endpoint)?
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .query(query);
        let response = self.send(request).await?;
        response
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout_secs))
    }
}

/// Pull a human-readable message out of an error body
///
/// Prefers `detail`, then `message`, then the canonical status text.
pub fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for field in ["detail", "message"] {
            match json.get(field) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
