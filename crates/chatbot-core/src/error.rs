//! Error types for the chat core.

use std::path::PathBuf;

use thiserror::Error;

/// Fallback text when a failed response carries no usable error message.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Local rejections of a submit. Neither reaches the network or the transcript.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("empty input")]
    EmptyInput,

    #[error("a request is already in flight")]
    Busy,
}

/// Failures of a single completion request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned {}: {}", .status, .message.as_deref().unwrap_or(UNKNOWN_ERROR))]
    Server { status: u16, message: Option<String> },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request task aborted: {0}")]
    Aborted(String),
}

impl CompletionError {
    /// Text shown to the user after the error marker.
    pub fn user_message(&self) -> String {
        match self {
            CompletionError::Network(msg)
            | CompletionError::Malformed(msg)
            | CompletionError::Aborted(msg) => msg.clone(),
            CompletionError::Server { message, .. } => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(UNKNOWN_ERROR)
                .to_string(),
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL carries the API key as a query parameter.
        let e = e.without_url();
        if e.is_decode() {
            CompletionError::Malformed(e.to_string())
        } else {
            CompletionError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CompletionError {
    fn from(e: serde_json::Error) -> Self {
        CompletionError::Malformed(e.to_string())
    }
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No API key configured. Set GEMINI_API_KEY or add \"api_key\" to {0:?}")]
    MissingApiKey(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_falls_back_to_unknown() {
        let err = CompletionError::Server {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), UNKNOWN_ERROR);
        assert_eq!(err.to_string(), "server returned 500: An unknown error occurred");

        let err = CompletionError::Server {
            status: 400,
            message: Some(String::new()),
        };
        assert_eq!(err.user_message(), UNKNOWN_ERROR);
    }

    #[test]
    fn test_server_message_passes_through() {
        let err = CompletionError::Server {
            status: 429,
            message: Some("quota exceeded".to_string()),
        };
        assert_eq!(err.user_message(), "quota exceeded");
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err: CompletionError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, CompletionError::Malformed(_)));
    }

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyInput.to_string(), "empty input");
    }
}
