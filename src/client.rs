use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    decode::decode_envelope,
    dispatch::{dispatch, merge_headers, prepare, resolve_url},
    retry, CallContext, ClientBuilder, ClientConfig, Envelope, Headers, Response, Result,
    RetryPolicy,
};

/// Outbound HTTP client with shared defaults and optional retries.
///
/// Cloning is cheap; clones share configuration and the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with no base URL, no default headers, a 30 second
    /// timeout and no retries.
    pub fn new() -> Self {
        Self::from_parts(reqwest::Client::new(), Arc::new(ClientConfig::default()))
    }

    /// Starts a [`ClientBuilder`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use outbound_http::{HttpClient, RetryPolicy};
    ///
    /// let client = HttpClient::builder()
    ///     .base_url("https://api.example.com")
    ///     .timeout(Duration::from_secs(10))
    ///     .header("User-Agent", "hub/1.0")
    ///     .retry_policy(RetryPolicy::default())
    ///     .build()
    ///     .expect("valid client options");
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(http: reqwest::Client, config: Arc<ClientConfig>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a request and returns the received response, whatever its
    /// status.
    ///
    /// `body`, when present, is sent as JSON. Uses the client retry policy
    /// if one was configured.
    pub async fn request<B>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.send(
            ctx,
            method,
            url,
            body,
            headers,
            false,
            self.config.retry_policy.as_ref(),
        )
        .await
    }

    /// Like [`HttpClient::request`], with `policy` in place of the client's
    /// retry policy for this call only.
    pub async fn request_with_retry<B>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
        policy: &RetryPolicy,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        policy.validate()?;
        self.send(ctx, method, url, body, headers, false, Some(policy))
            .await
    }

    pub async fn get(&self, ctx: &CallContext, url: &str, headers: &Headers) -> Result<Response> {
        self.verb::<()>(ctx, Method::GET, url, None, headers).await
    }

    /// Sends a POST; `None` sends an empty body. `Content-Type` defaults to
    /// `application/json` either way.
    pub async fn post<B>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.verb(ctx, Method::POST, url, body, headers).await
    }

    pub async fn put<B>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.verb(ctx, Method::PUT, url, body, headers).await
    }

    pub async fn patch<B>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.verb(ctx, Method::PATCH, url, body, headers).await
    }

    pub async fn delete(
        &self,
        ctx: &CallContext,
        url: &str,
        headers: &Headers,
    ) -> Result<Response> {
        self.verb::<()>(ctx, Method::DELETE, url, None, headers).await
    }

    /// Sends a request and decodes a 2xx JSON body into `T`.
    ///
    /// Only the HTTP attempt is retried; status and decode failures are
    /// returned as-is.
    pub async fn send_json<T, B>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.verb(ctx, method, url, body, headers).await?;
        decode_envelope(response)
    }

    pub async fn get_json<T>(&self, ctx: &CallContext, url: &str, headers: &Headers) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_json::<T, ()>(ctx, Method::GET, url, None, headers)
            .await
            .map(Envelope::into_value)
    }

    pub async fn post_json<T, B>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(ctx, Method::POST, url, body, headers)
            .await
            .map(Envelope::into_value)
    }

    pub async fn put_json<T, B>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(ctx, Method::PUT, url, body, headers)
            .await
            .map(Envelope::into_value)
    }

    pub async fn patch_json<T, B>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(ctx, Method::PATCH, url, body, headers)
            .await
            .map(Envelope::into_value)
    }

    pub async fn delete_json<T>(
        &self,
        ctx: &CallContext,
        url: &str,
        headers: &Headers,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send_json::<T, ()>(ctx, Method::DELETE, url, None, headers)
            .await
            .map(Envelope::into_value)
    }

    async fn verb<B>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let default_json = carries_body(&method);
        self.send(
            ctx,
            method,
            url,
            body,
            headers,
            default_json,
            self.config.retry_policy.as_ref(),
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn send<B>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        body: Option<&B>,
        headers: &Headers,
        default_json: bool,
        policy: Option<&RetryPolicy>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let scope = ctx.scope(self.config.timeout);
        let headers = merge_headers(&self.config.default_headers, headers, default_json)?;
        let url = resolve_url(&self.config.base_url, url);
        let request = prepare(method, &url, body, headers)?;

        let http = &self.http;
        let scope = &scope;
        let request = &request;
        retry::execute(policy, scope, move |attempt| {
            dispatch(http, scope, request, attempt)
        })
        .await
    }
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}
