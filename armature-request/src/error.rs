//! Request error types.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for request operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// Broad classification of a failure reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request or connection timed out.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// The redirect policy rejected the response.
    Redirect,
    /// The request or response body failed in flight.
    Body,
    /// The request could not be sent as built.
    Request,
    /// Anything the transport did not classify.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Redirect => "redirect",
            Self::Body => "body",
            Self::Request => "request",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Errors produced while building, encoding or dispatching a request.
///
/// Errors are `Clone` so the same value can be kept on a [`TraceLog`](crate::TraceLog)
/// and on the final [`RequestResult`](crate::RequestResult).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpClientError {
    /// The transport failed to deliver a complete response.
    #[error("Transport error ({kind}): {message}")]
    Transport {
        /// Failure class.
        kind: TransportErrorKind,
        /// Message reported by the transport.
        message: String,
    },

    /// The response body could not be read to the end.
    #[error("Failed to read response body: {0}")]
    BodyRead(String),

    /// The final attempt produced neither a response nor an error.
    #[error("No response received")]
    NoResponse,

    /// The final response did not carry the expected status.
    #[error("Response status is {status}, expected {expected}")]
    UnexpectedStatus {
        /// Status that was received.
        status: u16,
        /// Status the caller asked for.
        expected: u16,
    },

    /// The payload shape is not accepted by the chosen send method.
    #[error("Unsupported {payload} payload for {encoding} body")]
    UnsupportedPayload {
        /// Body encoding that was requested.
        encoding: &'static str,
        /// Shape of the payload that was supplied.
        payload: &'static str,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Form encoding error.
    #[error("Form encoding error: {0}")]
    Form(String),

    /// Multipart encoding error.
    #[error("Multipart encoding error: {0}")]
    Multipart(String),

    /// A file queued for upload could not be read.
    #[error("Failed to read file {}: {message}", path.display())]
    FileRead {
        /// Path that was read.
        path: PathBuf,
        /// I/O error message.
        message: String,
    },

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid HTTP method token.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid expected status code.
    #[error("Invalid status code: {0}")]
    InvalidStatus(u16),

    /// Request building error.
    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl HttpClientError {
    /// Check if this error was raised before any attempt was made.
    pub fn is_encoding(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPayload { .. }
                | Self::Json(_)
                | Self::Form(_)
                | Self::Multipart(_)
                | Self::FileRead { .. }
                | Self::InvalidUrl(_)
                | Self::InvalidMethod(_)
                | Self::InvalidHeader(_)
                | Self::InvalidStatus(_)
                | Self::RequestBuild(_)
        )
    }

    /// Check if this error came from the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::BodyRead(_))
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportErrorKind::Timeout,
                ..
            }
        )
    }

    /// Check if this is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportErrorKind::Connect,
                ..
            }
        )
    }

    /// Get the HTTP status code if this is an expectation mismatch.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn transport_kind(error: &reqwest::Error) -> TransportErrorKind {
    if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_redirect() {
        TransportErrorKind::Redirect
    } else if error.is_body() || error.is_decode() {
        TransportErrorKind::Body
    } else if error.is_request() || error.is_builder() {
        TransportErrorKind::Request
    } else {
        TransportErrorKind::Other
    }
}

impl From<reqwest::Error> for HttpClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            kind: transport_kind(&error),
            message: error.to_string(),
        }
    }
}

impl HttpClientError {
    /// Classify a failure raised while reading a response body.
    ///
    /// A timeout anywhere in the source chain becomes a `Timeout` transport
    /// error and a wrapped reqwest error keeps its transport kind. Anything
    /// else is a `BodyRead`. The message renders the whole chain.
    pub(crate) fn from_body_read(error: &io::Error) -> Self {
        let mut messages = vec![error.to_string()];
        let mut timed_out = error.kind() == io::ErrorKind::TimedOut;
        let mut kind = None;

        let mut current = error.get_ref().map(|e| e as &(dyn StdError + 'static));
        while let Some(err) = current {
            let text = err.to_string();
            if !messages.contains(&text) {
                messages.push(text);
            }
            if let Some(e) = err.downcast_ref::<reqwest::Error>() {
                kind.get_or_insert_with(|| transport_kind(e));
                timed_out |= e.is_timeout();
            }
            if let Some(e) = err.downcast_ref::<io::Error>() {
                timed_out |= e.kind() == io::ErrorKind::TimedOut;
            }
            current = err.source();
        }

        let message = messages.join(": ");
        match (timed_out, kind) {
            (true, _) => Self::Transport {
                kind: TransportErrorKind::Timeout,
                message,
            },
            (false, Some(kind)) => Self::Transport { kind, message },
            (false, None) => Self::BodyRead(message),
        }
    }
}

impl From<url::ParseError> for HttpClientError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error.to_string())
    }
}

impl From<serde_json::Error> for HttpClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = HttpClientError::Transport {
            kind: TransportErrorKind::Timeout,
            message: "deadline elapsed".to_string(),
        };
        assert!(err.is_transport());
        assert!(err.is_timeout());
        assert!(!err.is_connection());
        assert!(!err.is_encoding());

        let err = HttpClientError::UnsupportedPayload {
            encoding: "form",
            payload: "array",
        };
        assert!(err.is_encoding());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_error_display() {
        let err = HttpClientError::UnexpectedStatus {
            status: 404,
            expected: 200,
        };
        assert_eq!(err.to_string(), "Response status is 404, expected 200");
        assert_eq!(err.status_code(), Some(404));

        let err = HttpClientError::FileRead {
            path: PathBuf::from("/tmp/missing.txt"),
            message: "not found".to_string(),
        };
        assert!(err.to_string().contains("/tmp/missing.txt"));
    }

    #[derive(Debug, Error)]
    #[error("stream failed")]
    struct StreamFailed(#[source] io::Error);

    #[test]
    fn test_body_read_timeout_is_transport_timeout() {
        let err = HttpClientError::from_body_read(&io::Error::from(io::ErrorKind::TimedOut));
        assert!(err.is_timeout());

        let nested = io::Error::other(StreamFailed(io::Error::new(
            io::ErrorKind::TimedOut,
            "read deadline",
        )));
        let err = HttpClientError::from_body_read(&nested);
        assert!(err.is_timeout());
        assert_eq!(
            err,
            HttpClientError::Transport {
                kind: TransportErrorKind::Timeout,
                message: "stream failed: read deadline".to_string(),
            }
        );
    }

    #[test]
    fn test_body_read_other_failure() {
        let err = HttpClientError::from_body_read(&io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert_eq!(err, HttpClientError::BodyRead("reset".to_string()));
        assert!(err.is_transport());
        assert!(!err.is_timeout());
    }
}
