//! Error types for TeamCity REST queries.

use thiserror::Error;

use crate::http::{HttpError, HttpResponse};

/// Errors that can occur while querying the TeamCity REST API.
#[derive(Debug, Error)]
pub enum Error {
    /// The server rejected the credentials (HTTP 401).
    #[error("Unauthorized ({status}): {reason}")]
    Unauthorized {
        status: u16,
        reason: String,
        body: String,
    },

    /// Any other non-2xx response.
    #[error("HTTP error ({status}): {reason}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// The response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response was JSON but not an object.
    #[error("Unexpected payload from {url}: expected a JSON object")]
    UnexpectedPayload { url: String },

    /// The server base URL could not be parsed.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A strict single-result lookup matched more than one record.
    #[error("Expected one result, query matched {count}")]
    MultipleResults { count: u64 },

    /// Positional access past the end of the result set.
    #[error("Index {index} out of range for {len} results")]
    IndexOutOfRange { index: usize, len: usize },

    /// A slice was requested with a zero step.
    #[error("Slice step must be at least 1")]
    InvalidSlice,

    /// The current filter cannot address a single resource by path.
    #[error("Locator '{locator}' cannot be used for a detail lookup: {reason}")]
    DetailLocator { locator: String, reason: String },
}

impl Error {
    /// Build the error for a non-2xx response.
    ///
    /// 401 maps to [`Error::Unauthorized`], everything else to [`Error::Http`].
    pub fn from_response(url: &str, response: &HttpResponse) -> Self {
        let status = response.status;
        let reason = format!("{} for url: {}", status_reason(status), url);
        let body = response.text();
        if status == 401 {
            Error::Unauthorized {
                status,
                reason,
                body,
            }
        } else {
            Error::Http {
                status,
                reason,
                body,
            }
        }
    }

    /// HTTP status code, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized { status, .. } | Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[inline]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }
}

fn status_reason(status: u16) -> &'static str {
    match status {
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "Unexpected Status",
    }
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, Error>;
