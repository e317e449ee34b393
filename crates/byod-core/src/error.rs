//! Error types for dashboard API calls and progress streams

use thiserror::Error;

/// Fallback message when a transport error carries no text of its own
pub const CONNECTION_FAILED: &str = "connection failed";

/// Message used when a response has no readable body
pub const NO_RESPONSE_BODY: &str = "no response body";

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Could not reach the server (DNS, refused connection, TLS, ...)
    #[error("{message}")]
    Connect { url: String, message: String },

    /// Request exceeded the configured timeout
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Server rejected credentials (401/403)
    #[error("{detail}")]
    Auth { status: u16, detail: String },

    /// Any other non-2xx response
    #[error("{detail}")]
    Status { status: u16, detail: String },

    /// Response body could not be decoded into the expected shape
    #[error("invalid response: {0}")]
    Decode(String),

    /// Response came back without a body to stream
    #[error("no response body")]
    NoBody,

    /// Body stream failed after the connection was established
    #[error("stream interrupted: {0}")]
    Interrupted(String),

    /// Configuration file could not be read or parsed
    #[error("config error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status associated with the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status, .. } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// Message shown in a stream session's `error` field
    pub fn session_message(&self) -> String {
        match self {
            ApiError::Connect { message, .. } if message.trim().is_empty() => {
                CONNECTION_FAILED.to_string()
            }
            other => other.to_string(),
        }
    }

    /// Classify a reqwest error raised while sending or reading
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            return ApiError::Timeout { secs: timeout_secs };
        }
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        ApiError::Connect {
            url,
            message: root_cause(&err),
        }
    }
}

/// Innermost error message, which is the useful part of reqwest's chain
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_connect_message_falls_back() {
        let err = ApiError::Connect {
            url: "http://127.0.0.1:8420/api/submit".to_string(),
            message: "  ".to_string(),
        };
        assert_eq!(err.session_message(), CONNECTION_FAILED);

        let err = ApiError::Connect {
            url: String::new(),
            message: "Connection refused (os error 111)".to_string(),
        };
        assert_eq!(err.session_message(), "Connection refused (os error 111)");
    }

    #[test]
    fn test_status_detail_is_message() {
        let err = ApiError::Status {
            status: 400,
            detail: "bad request".to_string(),
        };
        assert_eq!(err.session_message(), "bad request");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_auth());
        assert_eq!(ApiError::NoBody.session_message(), NO_RESPONSE_BODY);
    }
}
