//! REST error types
//!
//! Error bodies look like `{"code": 50035, "message": "...", "errors": {...}}`
//! where `errors` nests per field. The nesting is flattened into
//! `field.0.sub: message` lines.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

/// Decoded error body of a failed request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiError {
    /// Platform error code, 0 when the body had none
    pub code: u32,
    pub message: String,
    /// Flattened per-field errors
    pub errors: Vec<String>,
}

impl ApiError {
    /// Build from a response body, which may be JSON or plain text
    pub fn from_body(body: &Value) -> Self {
        match body {
            Value::Object(map) => Self {
                code: map
                    .get("code")
                    .and_then(Value::as_u64)
                    .map_or(0, |c| c as u32),
                message: map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                errors: map.get("errors").map(flatten_errors).unwrap_or_default(),
            },
            Value::String(text) => Self {
                message: text.clone(),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(error code: {})", self.code)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        for line in &self.errors {
            write!(f, "\nIn {line}")?;
        }
        Ok(())
    }
}

/// Flatten a nested `errors` object into `path: message` lines
pub fn flatten_errors(errors: &Value) -> Vec<String> {
    let mut lines = Vec::new();
    flatten_into(errors, "", &mut lines);
    lines
}

fn flatten_into(value: &Value, prefix: &str, lines: &mut Vec<String>) {
    let Value::Object(map) = value else {
        if !prefix.is_empty() {
            lines.push(format!("{prefix}: {}", scalar_text(value)));
        }
        return;
    };

    for (key, inner) in map {
        if key == "_errors" {
            lines.push(format!("{prefix}: {}", joined_messages(inner)));
            continue;
        }
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match inner {
            Value::Object(child) if child.contains_key("_errors") => {
                lines.push(format!("{path}: {}", joined_messages(&child["_errors"])));
            }
            Value::Object(_) => flatten_into(inner, &path, lines),
            other => lines.push(format!("{path}: {}", scalar_text(other))),
        }
    }
}

fn joined_messages(errors: &Value) -> String {
    errors
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// REST errors
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Rejected before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection failures, timeouts and body read failures
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("401 Unauthorized: improper token has been passed")]
    Unauthorized,

    #[error("403 Forbidden {0}")]
    Forbidden(ApiError),

    #[error("404 Not Found {0}")]
    NotFound(ApiError),

    /// A 429 that did not come from the API itself (edge proxy block)
    #[error("429 Too Many Requests (retry after {retry_after:?}, global: {global})")]
    RateLimited {
        retry_after: Option<Duration>,
        global: bool,
    },

    /// 5xx, either immediately or after the retry budget ran out
    #[error("{status} Server Error {error}")]
    ServerError { status: u16, error: ApiError },

    #[error("{status} {error}")]
    Http { status: u16, error: ApiError },

    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl HttpError {
    /// HTTP status behind this error, if a response was received
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::ServerError { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Validation(_) | Self::Decode(_) => None,
        }
    }

    /// Platform error code from the body
    #[must_use]
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Forbidden(error)
            | Self::NotFound(error)
            | Self::ServerError { error, .. }
            | Self::Http { error, .. } => Some(error.code),
            _ => None,
        }
    }

    /// Whether trying again later could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } | Self::ServerError { .. } => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
            || self.status().is_some_and(|s| (400..500).contains(&s))
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| s >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_errors() {
        let errors = json!({
            "embeds": {
                "0": {
                    "title": {
                        "_errors": [
                            {"code": "BASE_TYPE_MAX_LENGTH", "message": "Must be 256 or fewer in length."}
                        ]
                    }
                }
            },
            "content": {
                "_errors": [
                    {"code": "A", "message": "Too long."},
                    {"code": "B", "message": "Bad."}
                ]
            }
        });

        let mut lines = flatten_errors(&errors);
        lines.sort();
        assert_eq!(
            lines,
            vec![
                "content: Too long. Bad.".to_string(),
                "embeds.0.title: Must be 256 or fewer in length.".to_string(),
            ]
        );
    }

    #[test]
    fn test_api_error_from_json_body() {
        let body = json!({"code": 50035, "message": "Invalid Form Body", "errors": {"name": {"_errors": [{"message": "Required"}]}}});
        let error = ApiError::from_body(&body);
        assert_eq!(error.code, 50035);
        assert_eq!(error.message, "Invalid Form Body");
        assert_eq!(error.errors, vec!["name: Required".to_string()]);
        assert!(error.to_string().contains("In name: Required"));
    }

    #[test]
    fn test_api_error_from_text_body() {
        let error = ApiError::from_body(&Value::String("upstream connect error".into()));
        assert_eq!(error.code, 0);
        assert_eq!(error.message, "upstream connect error");
    }

    #[test]
    fn test_error_classification() {
        let not_found = HttpError::NotFound(ApiError::default());
        assert_eq!(not_found.status(), Some(404));
        assert!(not_found.is_client_error());
        assert!(!not_found.is_retryable());

        let server = HttpError::ServerError {
            status: 502,
            error: ApiError::default(),
        };
        assert!(server.is_server_error());
        assert!(server.is_retryable());

        let validation = HttpError::Validation("empty file".into());
        assert!(validation.is_client_error());
        assert_eq!(validation.status(), None);
    }
}
