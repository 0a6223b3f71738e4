//! Error types for Trendbench.
//!
//! Errors fall into three groups that the UI treats the same way for display:
//! remote failures (HTTP status or network), logical execution failures
//! reported inside a successful response, and local validation failures that
//! never reach the network.

use thiserror::Error;

/// Main error type for Trendbench.
#[derive(Debug, Error)]
pub enum TrendError {
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The request never produced a response.
    #[error("Network error: {message}")]
    Transport {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution failed on the backend (200 status with an `error` field).
    #[error("{message}")]
    Execution {
        /// Error text reported by the backend.
        message: String,
    },

    /// Local validation failed; no request was sent.
    #[error("{message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Names of the fields that caused the failure.
        missing: Vec<String>,
    },

    /// The backend sent a body we could not decode.
    #[error("Invalid response: {message}")]
    Decode {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A local lookup (plot index, active template) found nothing.
    #[error("{message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Configuration error.
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
    },

    /// Unexpected internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl TrendError {
    // ========== Constructors ==========

    /// Create a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http { status, message: message.into() }
    }

    /// Create a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into(), source: None }
    }

    /// Create a new execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution { message: message.into() }
    }

    /// Create a validation error that is not tied to specific fields.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), missing: Vec::new() }
    }

    /// Create a validation error naming the missing fields.
    pub fn missing_fields(message: impl Into<String>, missing: Vec<String>) -> Self {
        Self::Validation { message: message.into(), missing }
    }

    /// Create a new decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into(), source: None }
    }

    /// Create a new not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    // ========== Methods ==========

    /// Check if this error was raised locally without contacting the backend.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. } | Self::Config { .. })
    }

    /// HTTP status code, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Field names reported by a validation failure.
    pub fn missing(&self) -> &[String] {
        match self {
            Self::Validation { missing, .. } => missing,
            _ => &[],
        }
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http { .. } => "Server",
            Self::Transport { .. } => "Network",
            Self::Execution { .. } => "Query",
            Self::Validation { .. } => "Validation",
            Self::Decode { .. } => "Response",
            Self::NotFound { .. } => "Not Found",
            Self::Config { .. } => "Config",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Get actionable hint for the user.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Http { status, .. } if *status >= 500 => Some("Check the server logs"),
            Self::Http { .. } => None,
            Self::Transport { .. } => Some("Check that the trend service is running"),
            Self::Execution { .. } => Some("Check the SQL and parameter values"),
            Self::Validation { .. } => None,
            Self::Decode { .. } => Some("The server may be running an incompatible version"),
            Self::NotFound { .. } => None,
            Self::Config { .. } => Some("Check TRENDBENCH_API_URL and TRENDBENCH_TIMEOUT_SECS"),
            Self::Internal { .. } => Some("Please report this issue"),
        }
    }

    /// Convert to user-displayable error info.
    pub fn to_error_info(&self) -> ErrorInfo {
        let error_type = format!("{} Error", self.category());
        let message = self.to_string();
        let hint = self.hint().map(String::from);

        let technical_detail = match self {
            Self::Http { status, .. } => Some(format!("Status: {status}")),
            Self::Validation { missing, .. } if !missing.is_empty() => {
                Some(format!("Missing: {}", missing.join(", ")))
            }
            Self::Transport { source: Some(source), .. }
            | Self::Decode { source: Some(source), .. } => Some(source.to_string()),
            _ => None,
        };

        ErrorInfo { error_type, message, hint, technical_detail }
    }
}

/// User-displayable error information.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Category name (e.g., "Network Error").
    pub error_type: String,
    /// User-friendly message.
    pub message: String,
    /// Actionable suggestion.
    pub hint: Option<String>,
    /// Status code, missing fields or the underlying cause.
    pub technical_detail: Option<String>,
}

/// Build the message surfaced for a non-2xx response.
///
/// The `detail` field may be a string or a list of `{msg}` objects; list
/// entries are joined with `"; "`. Without a usable `detail`, the raw JSON body
/// is used, then the status text.
pub fn extract_error_message(status_text: &str, body: &str) -> String {
    let Ok(data) = serde_json::from_str::<serde_json::Value>(body) else {
        return status_text.to_string();
    };

    match data.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(entries)) => entries
            .iter()
            .map(|entry| match entry.get("msg").and_then(|m| m.as_str()) {
                Some(msg) if !msg.is_empty() => msg.to_string(),
                _ => entry.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => {
            let empty = match &data {
                serde_json::Value::Null => true,
                serde_json::Value::Object(map) => map.is_empty(),
                _ => false,
            };
            if empty {
                status_text.to_string()
            } else {
                data.to_string()
            }
        }
    }
}

// ========== Error Conversions ==========

/// Convert from reqwest::Error to TrendError.
impl From<reqwest::Error> for TrendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return TrendError::Decode { message: err.to_string(), source: Some(Box::new(err)) };
        }

        if let Some(status) = err.status() {
            let text = status.canonical_reason().unwrap_or("Request failed");
            return TrendError::Http { status: status.as_u16(), message: text.to_string() };
        }

        let message = if err.is_timeout() {
            "Request timed out".to_string()
        } else if err.is_connect() {
            "Could not connect to the trend service".to_string()
        } else {
            err.to_string()
        };
        TrendError::Transport { message, source: Some(Box::new(err)) }
    }
}

/// Convert from serde_json::Error to TrendError.
impl From<serde_json::Error> for TrendError {
    fn from(err: serde_json::Error) -> Self {
        TrendError::Decode { message: format!("JSON error: {err}"), source: Some(Box::new(err)) }
    }
}
