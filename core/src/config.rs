//! Connection pool and timeout configuration.
//!
//! # Design
//! `ClientConfig::default()` carries the tuning every service shares. The
//! same fields can be overridden from `REQUESTS_*` environment variables so
//! deployments adjust limits without a rebuild. Durations are given in
//! milliseconds.

use std::str::FromStr;
use std::time::Duration;

use crate::body::JsonErrorPolicy;
use crate::error::RequestError;

/// Settings fixed for the lifetime of a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Idle connections kept across all hosts.
    pub max_idle_connections: usize,
    /// Idle connections kept per host.
    pub max_idle_connections_per_host: usize,
    /// In-flight requests per host; further callers wait. `0` disables the bound.
    pub max_connections_per_host: usize,
    /// How long an idle connection stays in the pool.
    pub idle_timeout: Duration,
    /// TCP connect plus TLS handshake.
    pub connect_timeout: Duration,
    /// Wait for the response status line and headers.
    pub response_header_timeout: Duration,
    /// Wait for `100 Continue` before sending the body anyway.
    pub expect_continue_timeout: Duration,
    pub max_response_header_size: usize,
    /// Upper bound on a buffered response body.
    pub max_body_size: u64,
    /// Whole-call timeout unless the request carries its own.
    pub request_timeout: Duration,
    pub json_errors: JsonErrorPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 5000,
            max_idle_connections_per_host: 1000,
            max_connections_per_host: 200,
            idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(30),
            response_header_timeout: Duration::from_secs(5),
            expect_continue_timeout: Duration::from_secs(1),
            max_response_header_size: 10 << 20,
            max_body_size: u64::MAX,
            request_timeout: Duration::from_secs(30),
            json_errors: JsonErrorPolicy::Surface,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `REQUESTS_*` variables in the environment.
    pub fn from_env() -> Result<Self, RequestError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RequestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let env = Lookup(lookup);

        env.count("REQUESTS_MAX_IDLE_CONNECTIONS", &mut config.max_idle_connections)?;
        env.count(
            "REQUESTS_MAX_IDLE_CONNECTIONS_PER_HOST",
            &mut config.max_idle_connections_per_host,
        )?;
        env.count("REQUESTS_MAX_CONNECTIONS_PER_HOST", &mut config.max_connections_per_host)?;
        env.millis("REQUESTS_IDLE_TIMEOUT_MS", &mut config.idle_timeout)?;
        env.millis("REQUESTS_CONNECT_TIMEOUT_MS", &mut config.connect_timeout)?;
        env.millis(
            "REQUESTS_RESPONSE_HEADER_TIMEOUT_MS",
            &mut config.response_header_timeout,
        )?;
        env.millis(
            "REQUESTS_EXPECT_CONTINUE_TIMEOUT_MS",
            &mut config.expect_continue_timeout,
        )?;
        env.count(
            "REQUESTS_MAX_RESPONSE_HEADER_SIZE",
            &mut config.max_response_header_size,
        )?;
        env.count("REQUESTS_MAX_BODY_SIZE", &mut config.max_body_size)?;
        env.millis("REQUESTS_TIMEOUT_MS", &mut config.request_timeout)?;

        if let Some(raw) = env.get("REQUESTS_JSON_ERRORS") {
            config.json_errors = match raw.as_str() {
                "surface" => JsonErrorPolicy::Surface,
                "empty" => JsonErrorPolicy::EmptyBody,
                other => {
                    return Err(RequestError::InvalidConfig(format!(
                        "REQUESTS_JSON_ERRORS: expected `surface` or `empty`, got {other:?}"
                    )))
                }
            };
        }

        Ok(config)
    }
}

struct Lookup<F>(F);

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn count<T: FromStr>(&self, name: &str, slot: &mut T) -> Result<(), RequestError>
    where
        T::Err: std::fmt::Display,
    {
        if let Some(raw) = self.get(name) {
            *slot = raw
                .parse()
                .map_err(|e| RequestError::InvalidConfig(format!("{name}={raw:?}: {e}")))?;
        }
        Ok(())
    }

    fn millis(&self, name: &str, slot: &mut Duration) -> Result<(), RequestError> {
        let mut ms = slot.as_millis() as u64;
        self.count(name, &mut ms)?;
        *slot = Duration::from_millis(ms);
        Ok(())
    }
}
