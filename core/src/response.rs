//! Dispatched and fully-read responses.

use std::borrow::Cow;
use std::fmt;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::RequestError;
use crate::http::{find_header, Headers};
use crate::pool::HostPermit;

/// A response whose body has not been read yet.
///
/// Holds the per-host permit of the client that produced it. Reading or
/// dropping the response releases it.
pub struct RawResponse {
    inner: ureq::http::Response<ureq::Body>,
    _permit: HostPermit,
}

impl RawResponse {
    pub(crate) fn new(inner: ureq::http::Response<ureq::Body>, permit: HostPermit) -> Self {
        Self {
            inner,
            _permit: permit,
        }
    }

    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Drain the body into memory, failing if it exceeds `limit` bytes.
    pub fn read(self, limit: u64) -> Result<Response, RequestError> {
        let RawResponse { inner, _permit } = self;
        let (parts, mut body) = inner.into_parts();

        let body = body
            .with_config()
            .limit(limit)
            .read_to_vec()
            .map_err(|e| RequestError::Read(e.to_string()))?;

        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let status = parts.status.as_u16();
        debug!(status, bytes = body.len(), "response read");
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status())
            .field("headers", self.inner.headers())
            .finish_non_exhaustive()
    }
}

/// Status, headers, and buffered body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        serde_json::from_slice(&self.body).map_err(|e| RequestError::Deserialization(e.to_string()))
    }
}
