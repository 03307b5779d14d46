//! Blocking HTTP client over one shared connection pool.
//!
//! # Design
//! `Client` wraps a `ureq::Agent` configured once from `ClientConfig` plus a
//! `HostLimiter` that bounds in-flight requests per host. Both are shared
//! behind `Arc`s, so cloning a client is cheap and every clone draws on the
//! same pool. Calls block the current thread and are never retried.
//!
//! Most services use `Client::shared()` through the free functions at the
//! bottom of this module; tests and services with special tuning construct
//! their own `Client` from a `ClientConfig`.

use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use ureq::http::Uri;

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::http::{ContentType, Headers, HttpMethod, Request, RequestBuilder};
use crate::params::ParamMap;
use crate::pool::HostLimiter;
use crate::response::{RawResponse, Response};

static SHARED: LazyLock<Client> = LazyLock::new(|| {
    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring environment overrides for the shared client");
        ClientConfig::default()
    });
    Client::new(config)
});

#[derive(Clone)]
pub struct Client {
    agent: ureq::Agent,
    limiter: Arc<HostLimiter>,
    config: Arc<ClientConfig>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_idle_connections(config.max_idle_connections)
            .max_idle_connections_per_host(config.max_idle_connections_per_host)
            .max_idle_age(config.idle_timeout)
            .timeout_connect(Some(config.connect_timeout))
            .timeout_recv_response(Some(config.response_header_timeout))
            .timeout_await_100(Some(config.expect_continue_timeout))
            .timeout_global(Some(config.request_timeout))
            .max_response_header_size(config.max_response_header_size)
            .build()
            .new_agent();

        Self {
            agent,
            limiter: HostLimiter::new(config.max_connections_per_host),
            config: Arc::new(config),
        }
    }

    /// Process-wide client, built on first use from `ClientConfig::from_env`.
    pub fn shared() -> &'static Client {
        &SHARED
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a request that follows this client's JSON error policy.
    pub fn request(&self, method: HttpMethod, url: &str) -> RequestBuilder {
        RequestBuilder::new(method, url).json_policy(self.config.json_errors)
    }

    /// Send `request` and return the response with its body unread.
    pub fn dispatch(&self, request: &Request) -> Result<RawResponse, RequestError> {
        let timeout = request.timeout().unwrap_or(self.config.request_timeout);
        let deadline = Instant::now().checked_add(timeout);

        let host = host_key(request.url())?;
        let permit = self.limiter.acquire(&host, timeout)?;
        // `None` lifts the agent's global timeout for waits too large to track.
        let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));

        debug!(method = %request.method(), url = request.url(), "dispatching request");
        let result = match request.method() {
            HttpMethod::Get => {
                let mut builder = self.agent.get(request.url());
                for (name, value) in request.headers() {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.config().timeout_global(remaining).build().call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(request.url());
                for (name, value) in request.headers() {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder
                    .config()
                    .timeout_global(remaining)
                    .build()
                    .send(request.body().unwrap_or_default())
            }
        };

        let response = result.map_err(|e| {
            warn!(method = %request.method(), url = request.url(), error = %e, "request failed");
            RequestError::Transport(e.to_string())
        })?;
        Ok(RawResponse::new(response, permit))
    }

    /// Drain a dispatched response, bounded by `max_body_size`.
    pub fn read(&self, response: RawResponse) -> Result<Response, RequestError> {
        response.read(self.config.max_body_size)
    }

    /// Dispatch `request` and read the whole body.
    pub fn execute(&self, request: &Request) -> Result<Response, RequestError> {
        let response = self.dispatch(request)?;
        self.read(response)
    }

    /// GET with `params` folded into the query string.
    pub fn get(&self, url: &str, params: ParamMap) -> Result<RawResponse, RequestError> {
        let request = self.request(HttpMethod::Get, url).params(params).build()?;
        self.dispatch(&request)
    }

    /// POST a form-encoded body.
    pub fn form(
        &self,
        url: &str,
        params: ParamMap,
        headers: Option<Headers>,
        timeout: Option<Duration>,
    ) -> Result<RawResponse, RequestError> {
        self.post(ContentType::Form, url, params, headers, timeout)
    }

    /// POST a JSON body.
    pub fn json(
        &self,
        url: &str,
        params: ParamMap,
        headers: Option<Headers>,
        timeout: Option<Duration>,
    ) -> Result<RawResponse, RequestError> {
        self.post(ContentType::Json, url, params, headers, timeout)
    }

    /// Pick `get`, `form`, or `json` from the method and content type.
    pub fn auto(
        &self,
        method: HttpMethod,
        content_type: ContentType,
        url: &str,
        params: ParamMap,
        headers: Option<Headers>,
        timeout: Option<Duration>,
    ) -> Result<RawResponse, RequestError> {
        match method {
            HttpMethod::Get => {
                let mut builder = self
                    .request(HttpMethod::Get, url)
                    .params(params)
                    .headers(headers.unwrap_or_default());
                if let Some(timeout) = timeout {
                    builder = builder.timeout(timeout);
                }
                self.dispatch(&builder.build()?)
            }
            HttpMethod::Post => self.post(content_type, url, params, headers, timeout),
        }
    }

    pub fn fast_get(&self, url: &str, params: ParamMap) -> Result<Response, RequestError> {
        let response = self.get(url, params)?;
        self.read(response)
    }

    pub fn post_form(
        &self,
        url: &str,
        params: ParamMap,
        headers: Option<Headers>,
        timeout: Option<Duration>,
    ) -> Result<Response, RequestError> {
        let response = self.form(url, params, headers, timeout)?;
        self.read(response)
    }

    pub fn post_json(
        &self,
        url: &str,
        params: ParamMap,
        headers: Option<Headers>,
        timeout: Option<Duration>,
    ) -> Result<Response, RequestError> {
        let response = self.json(url, params, headers, timeout)?;
        self.read(response)
    }

    fn post(
        &self,
        content_type: ContentType,
        url: &str,
        params: ParamMap,
        headers: Option<Headers>,
        timeout: Option<Duration>,
    ) -> Result<RawResponse, RequestError> {
        let mut builder = self
            .request(HttpMethod::Post, url)
            .params(params)
            .headers(headers.unwrap_or_default())
            .force_content_type(content_type);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        self.dispatch(&builder.build()?)
    }
}

/// `host:port` of `url`, used to group requests per target.
fn host_key(url: &str) -> Result<String, RequestError> {
    let uri: Uri = url
        .parse()
        .map_err(|e| RequestError::Construction(format!("url {url:?}: {e}")))?;
    let host = uri
        .host()
        .ok_or_else(|| RequestError::Construction(format!("url {url:?}: missing host")))?;
    let port = uri
        .port_u16()
        .unwrap_or(if uri.scheme_str() == Some("https") { 443 } else { 80 });
    Ok(format!("{host}:{port}"))
}

// ---------------------------------------------------------------------------
// Shared-client shorthands
// ---------------------------------------------------------------------------

pub fn execute(request: &Request) -> Result<Response, RequestError> {
    Client::shared().execute(request)
}

pub fn get(url: &str, params: ParamMap) -> Result<RawResponse, RequestError> {
    Client::shared().get(url, params)
}

pub fn form(
    url: &str,
    params: ParamMap,
    headers: Option<Headers>,
    timeout: Option<Duration>,
) -> Result<RawResponse, RequestError> {
    Client::shared().form(url, params, headers, timeout)
}

pub fn json(
    url: &str,
    params: ParamMap,
    headers: Option<Headers>,
    timeout: Option<Duration>,
) -> Result<RawResponse, RequestError> {
    Client::shared().json(url, params, headers, timeout)
}

pub fn auto(
    method: HttpMethod,
    content_type: ContentType,
    url: &str,
    params: ParamMap,
    headers: Option<Headers>,
    timeout: Option<Duration>,
) -> Result<RawResponse, RequestError> {
    Client::shared().auto(method, content_type, url, params, headers, timeout)
}

pub fn fast_get(url: &str, params: ParamMap) -> Result<Response, RequestError> {
    Client::shared().fast_get(url, params)
}

pub fn post_form(
    url: &str,
    params: ParamMap,
    headers: Option<Headers>,
    timeout: Option<Duration>,
) -> Result<Response, RequestError> {
    Client::shared().post_form(url, params, headers, timeout)
}

pub fn post_json(
    url: &str,
    params: ParamMap,
    headers: Option<Headers>,
    timeout: Option<Duration>,
) -> Result<Response, RequestError> {
    Client::shared().post_json(url, params, headers, timeout)
}
