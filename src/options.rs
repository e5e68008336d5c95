use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{HttpClient, HttpError, Result, RetryPolicy};

/// Overall per-call deadline used when the caller supplies none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable configuration shared by every call of one [`HttpClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Prefix prepended to every request path. Empty means none.
    pub base_url: String,
    /// Headers applied to every request before per-call headers.
    pub default_headers: HeaderMap,
    /// Deadline for a whole call, including retries and backoff waits.
    /// Zero means no deadline.
    pub timeout: Duration,
    /// Retry behavior; `None` sends each request exactly once.
    pub retry_policy: Option<RetryPolicy>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_policy: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .default_headers
            .keys()
            .map(|name| (name.as_str(), "<redacted>"))
            .collect();
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &headers)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

/// Builds an [`HttpClient`]. Options apply in call order; a later option
/// overwrites an earlier one of the same kind, and a repeated header
/// overwrites by name.
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
    retry_policy: Option<RetryPolicy>,
    transport: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Deadline for each whole call. `Duration::ZERO` disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Enables retries for every call made through the client.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Replaces the underlying connection layer.
    pub fn transport(mut self, client: reqwest::Client) -> Self {
        self.transport = Some(client);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut default_headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let (name, value) = parse_header(name, value).map_err(HttpError::InvalidConfig)?;
            default_headers.insert(name, value);
        }

        if let Some(policy) = &self.retry_policy {
            policy.validate()?;
        }

        let config = ClientConfig {
            base_url: self.base_url.unwrap_or_default(),
            default_headers,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            retry_policy: self.retry_policy,
        };
        let http = self.transport.unwrap_or_default();
        Ok(HttpClient::from_parts(http, Arc::new(config)))
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers.len())
            .field("retry_policy", &self.retry_policy)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

pub(crate) fn parse_header(
    name: &str,
    value: &str,
) -> std::result::Result<(HeaderName, HeaderValue), String> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| format!("invalid header name '{name}': {err}"))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|err| format!("invalid value for header '{name}': {err}"))?;
    Ok((header_name, header_value))
}
