//! Typed failures of the World Bank fetch layer.
//!
//! These never reach the view pipeline: `WorldBankClient::fetch` logs them and
//! returns an empty dataset. `try_fetch` keeps them for diagnostics and tests.

use crate::domain::Year;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, connection, timeout).
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The API answered with something other than 200 OK.
    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    /// The body was not the expected JSON envelope.
    #[error("malformed payload from {url}: {source}")]
    Payload {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A well-formed envelope that carried no usable records.
    #[error("{url} returned no usable records")]
    Empty { url: String },

    /// The requested span runs backwards.
    #[error("invalid year range {start}:{end}")]
    ReversedRange { start: Year, end: Year },
}

impl FetchError {
    pub fn is_status(&self) -> bool {
        matches!(self, FetchError::Status { .. })
    }
}
