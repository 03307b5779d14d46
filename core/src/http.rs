//! Outbound request description.
//!
//! # Design
//! A `Request` is fully formed at construction: GET parameters are folded
//! into the URL and POST bodies are serialized up front, so dispatch never
//! encodes anything. Fields are private; once built, a request is read-only.
//!
//! Headers are an ordered list of owned pairs. Lookups and the forced
//! `Content-Type` override compare names case-insensitively.

use std::fmt;
use std::time::Duration;

use ureq::http::{HeaderName, HeaderValue, Uri};

use crate::body::{build_body, JsonErrorPolicy};
use crate::encode::encode_query;
use crate::error::RequestError;
use crate::params::ParamMap;

/// Header list attached to a request.
pub type Headers = Vec<(String, String)>;

pub const CONTENT_TYPE: &str = "Content-Type";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialization used for a POST body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Form,
    Json,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Form => "application/x-www-form-urlencoded",
            ContentType::Json => "application/json",
        }
    }

    /// Value sent in the `Content-Type` header by the convenience entry points.
    pub fn header_value(&self) -> &'static str {
        match self {
            ContentType::Form => "application/x-www-form-urlencoded",
            ContentType::Json => "application/json;charset=utf-8",
        }
    }
}

/// Replace every header named `name` (any case) with a single entry.
pub fn set_header(headers: &mut Headers, name: &str, value: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

/// First value of header `name`, compared case-insensitively.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A request ready for dispatch.
#[derive(Debug, Clone)]
pub struct Request {
    method: HttpMethod,
    content_type: ContentType,
    url: String,
    params: ParamMap,
    headers: Headers,
    timeout: Option<Duration>,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Build a request in one call. Serialization failures surface as errors.
    pub fn new(
        method: HttpMethod,
        content_type: ContentType,
        url: &str,
        params: ParamMap,
        headers: Headers,
        timeout: Option<Duration>,
    ) -> Result<Self, RequestError> {
        let mut builder = RequestBuilder::new(method, url)
            .content_type(content_type)
            .params(params)
            .headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Target URL, including the folded query string for GET.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parameters still attached to the request. Always empty for GET.
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Encoded body. `None` for GET.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Step-by-step construction of a [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: HttpMethod,
    content_type: ContentType,
    url: String,
    params: ParamMap,
    headers: Headers,
    timeout: Option<Duration>,
    json_policy: JsonErrorPolicy,
}

impl RequestBuilder {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            method,
            content_type: ContentType::Form,
            url: url.to_string(),
            params: ParamMap::new(),
            headers: Headers::new(),
            timeout: None,
            json_policy: JsonErrorPolicy::default(),
        }
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn params(mut self, params: ParamMap) -> Self {
        self.params = params;
        self
    }

    /// Replace the header list.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Append one header, keeping any existing entries with the same name.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set `Content-Type` from the content type, replacing any existing value.
    pub fn force_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        set_header(&mut self.headers, CONTENT_TYPE, content_type.header_value());
        self
    }

    /// Per-call timeout. Without one the client's configured timeout applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn json_policy(mut self, policy: JsonErrorPolicy) -> Self {
        self.json_policy = policy;
        self
    }

    pub fn build(self) -> Result<Request, RequestError> {
        let (url, params, body) = match self.method {
            HttpMethod::Get => (get_request_url(&self.url, &self.params), ParamMap::new(), None),
            HttpMethod::Post => {
                let body = build_body(self.content_type, &self.params, self.json_policy)?;
                (self.url, self.params, Some(body))
            }
        };

        validate_url(&url)?;
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RequestError::Construction(format!("header name {name:?}: {e}")))?;
            HeaderValue::from_str(value)
                .map_err(|e| RequestError::Construction(format!("header {name}: {e}")))?;
        }

        Ok(Request {
            method: self.method,
            content_type: self.content_type,
            url,
            params,
            headers: self.headers,
            timeout: self.timeout,
            body,
        })
    }
}

/// Fold `params` into the query string of `url`.
///
/// An existing query is extended with `&`; an empty encoding leaves the URL
/// untouched.
fn get_request_url(url: &str, params: &ParamMap) -> String {
    let query = encode_query(params, None);
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

fn validate_url(url: &str) -> Result<(), RequestError> {
    let uri: Uri = url
        .parse()
        .map_err(|e| RequestError::Construction(format!("url {url:?}: {e}")))?;
    match (uri.scheme_str(), uri.authority()) {
        (Some("http") | Some("https"), Some(_)) => Ok(()),
        _ => Err(RequestError::Construction(format!(
            "url {url:?}: expected an absolute http(s) url"
        ))),
    }
}
