//! Compact outbound HTTP calls for internal services.
//!
//! # Overview
//! Encodes nested parameter maps as form or JSON bodies (or as a GET query
//! string), sends the request over one shared, pre-tuned connection pool, and
//! hands back the status code with the fully-buffered body.
//!
//! # Design
//! - `encode` holds the only real algorithm: recursive flattening of nested
//!   maps into `parent[child]=value` query pairs.
//! - `Request` is built once and never re-encoded; GET parameters live in the
//!   URL by the time a request exists.
//! - `Client` owns the pool. `Client::shared()` and the free functions
//!   (`fast_get`, `post_form`, `post_json`, ...) cover the common case.
//! - Errors name the stage that failed; nothing is retried.
//!
//! ```no_run
//! use requests_core::{params, post_json};
//!
//! let resp = post_json("http://localhost:3000/echo", params! { "n" => 3 }, None, None)?;
//! assert!(resp.is_success());
//! # Ok::<(), requests_core::RequestError>(())
//! ```

pub mod body;
pub mod client;
pub mod config;
pub mod encode;
pub mod error;
pub mod http;
pub mod params;
mod pool;
pub mod response;

pub use body::{build_body, JsonErrorPolicy};
pub use client::{auto, execute, fast_get, form, get, json, post_form, post_json, Client};
pub use config::ClientConfig;
pub use encode::encode_query;
pub use error::RequestError;
pub use http::{ContentType, Headers, HttpMethod, Request, RequestBuilder};
pub use params::{ParamMap, ParamValue};
pub use response::{RawResponse, Response};
