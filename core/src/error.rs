//! Error types for the Pinboard API client.
//!
//! # Design
//! A single `ApiError` enum carries every failure an operation can return.
//! Variants group into four kinds (see `ErrorKind`): transport failures,
//! decode failures, logical failures reported by a well-formed response, and
//! calls made before the session authenticated. Callers that only care about
//! the category match on `ApiError::kind()`.

use thiserror::Error;

/// Errors returned by `PinboardClient` parse methods and `Pinboard` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    /// DNS, connection or I/O failure below HTTP.
    #[error("request failed: {0}")]
    Network(String),

    /// The body was empty or a bare newline.
    #[error("no data returned from server")]
    NoData,

    /// The configured base URL could not be combined with an endpoint path.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Malformed JSON, unexpected root shape, or a missing/mistyped field.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// The server returned a result code other than `done`.
    #[error("server reported failure: {0}")]
    Protocol(String),

    /// An operation was attempted before `authenticate` succeeded.
    #[error("API not authenticated")]
    Unauthenticated,
}

/// Coarse category of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Decode,
    Protocol,
    Auth,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::HttpStatus { .. }
            | ApiError::Network(_)
            | ApiError::NoData
            | ApiError::InvalidUrl(_) => ErrorKind::Transport,
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::Protocol(_) => ErrorKind::Protocol,
            ApiError::Unauthenticated => ErrorKind::Auth,
        }
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        ApiError::Decode(msg.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_renders_code_and_reason() {
        let err = ApiError::HttpStatus {
            status: 500,
            reason: "Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error");
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn no_data_message() {
        assert_eq!(ApiError::NoData.to_string(), "no data returned from server");
    }

    #[test]
    fn kinds_cover_every_category() {
        assert_eq!(ApiError::decode("x").kind(), ErrorKind::Decode);
        assert_eq!(ApiError::Protocol("item not found".into()).kind(), ErrorKind::Protocol);
        assert_eq!(ApiError::Unauthenticated.kind(), ErrorKind::Auth);
        assert_eq!(ApiError::Network("refused".into()).kind(), ErrorKind::Transport);
        assert_eq!(ApiError::InvalidUrl("nope".into()).kind(), ErrorKind::Transport);
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: ApiError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
