//! Typed errors and decoding of server error bodies.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),
    #[error("not found: {}", .detail.as_deref().unwrap_or("no such resource"))]
    NotFound { detail: Option<String> },
    #[error("unauthorized: {}", .detail.as_deref().unwrap_or("credentials rejected"))]
    Unauthorized { detail: Option<String> },
    #[error("server error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },
    #[error("validation: {0}")]
    Validation(String),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error envelope returned by the catalog API: `{"detail": "..."}` or a list of field errors.
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Flatten `detail` into one line. Field-error lists are joined by `; `.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Object(obj) => obj.get("msg").and_then(Value::as_str).map(str::to_string),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl ClientError {
    /// Map a non-success response to an error, keeping the server `detail` when the body carries one.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message());
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound { detail },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized { detail },
            _ => ClientError::Server {
                status: status.as_u16(),
                detail,
            },
        }
    }

    /// Whether a retry may succeed: connection failures, timeouts, 429 and gateway-style 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ClientError::Server { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// Server-provided detail message, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::NotFound { detail }
            | ClientError::Unauthorized { detail }
            | ClientError::Server { detail, .. } => detail.as_deref(),
            ClientError::Validation(msg) => Some(msg.as_str()),
            _ => None,
        }
    }

    /// Text for inline form errors: the server detail when available, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_kept() {
        let err = ClientError::from_status(StatusCode::NOT_FOUND, br#"{"detail":"Movie not found"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.detail(), Some("Movie not found"));
        assert_eq!(err.to_string(), "not found: Movie not found");
    }

    #[test]
    fn field_error_list_is_joined() {
        let body = br#"{"detail":[{"loc":["query","limit"],"msg":"must be >= 1"},{"msg":"bad year"}]}"#;
        let err = ClientError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.detail(), Some("must be >= 1; bad year"));
        assert!(!err.is_transient());
    }

    #[test]
    fn non_json_body_has_no_detail() {
        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.detail(), None);
        assert!(err.is_transient());
        assert_eq!(err.user_message("Failed to upload movies"), "Failed to upload movies");
    }

    #[test]
    fn auth_statuses_map_to_unauthorized() {
        let err = ClientError::from_status(StatusCode::UNAUTHORIZED, br#"{"detail":"Incorrect username or password"}"#);
        assert!(matches!(err, ClientError::Unauthorized { .. }));
        assert_eq!(err.user_message("Authentication failed"), "Incorrect username or password");
    }
}
