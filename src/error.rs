//! Error types for the portal client and the credential store.

use std::path::PathBuf;

/// Failures talking to the recruitment API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable bearer token; raised before any request is sent.
    #[error("not authenticated: no stored token")]
    Unauthenticated,

    /// Server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport failure (connect, timeout, TLS).
    #[error("network error: {message}")]
    Network { message: String },

    /// Body could not be decoded into the expected shape.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Login endpoint answered without a token.
    #[error("login rejected: {message}")]
    LoginRejected { message: String },
}

impl ApiError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures reading or writing the credential file.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to read credentials at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write credentials at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credentials at {path} are not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no config directory available; pass --credentials explicitly")]
    NoConfigDir,
}
