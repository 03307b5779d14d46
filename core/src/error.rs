//! Error types for outbound requests.
//!
//! # Design
//! Each variant names the stage that failed: building the request, moving
//! bytes over the wire, draining the response, or (de)serializing JSON.
//! Payloads are plain messages rather than wrapped transport errors, matching
//! how the rest of the crate logs them.

use std::fmt;

/// Errors returned while building, dispatching, or reading a request.
#[derive(Debug)]
pub enum RequestError {
    /// The request could not be built: malformed URL or invalid header.
    Construction(String),

    /// Connection failure, timeout, or protocol error during dispatch.
    Transport(String),

    /// The response body could not be fully drained.
    Read(String),

    /// The parameters could not be serialized to a JSON body.
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    Deserialization(String),

    /// An environment override held a value that could not be parsed.
    InvalidConfig(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Construction(msg) => write!(f, "invalid request: {msg}"),
            RequestError::Transport(msg) => write!(f, "transport failed: {msg}"),
            RequestError::Read(msg) => write!(f, "reading response body failed: {msg}"),
            RequestError::Serialization(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            RequestError::Deserialization(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
            RequestError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for RequestError {}
