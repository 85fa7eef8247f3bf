//! Minimal HTTP seam between the World Bank client and the network.
//!
//! Production code uses [`ReqwestTransport`]; tests substitute a scripted fake
//! so fetch/caching behavior is checked without a live API.

use reqwest::blocking::Client;

use crate::data::error::FetchError;

/// A completed HTTP exchange (any status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

pub trait Transport: Send + Sync {
    /// Issue one GET. Only failures to obtain a response are errors; non-200
    /// statuses come back as an `HttpResponse`.
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, FetchError>;
}

/// Blocking `reqwest` transport with the client's default timeout.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: format!("failed to read body: {e}"),
        })?;

        Ok(HttpResponse { status, body })
    }
}
