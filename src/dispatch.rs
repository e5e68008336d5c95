use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Method, Url,
};
use serde::Serialize;

use crate::{context::CallScope, options::parse_header, Headers, HttpError, Response, Result};

/// A fully resolved request: serialized once, sent once per attempt.
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Bytes>,
}

/// Prefixes `path` with `base_url` unless the base is empty.
pub(crate) fn resolve_url(base_url: &str, path: &str) -> String {
    if base_url.is_empty() {
        path.to_owned()
    } else {
        format!("{base_url}{path}")
    }
}

/// Applies default headers, then per-call headers over them.
///
/// With `default_json` set and no `Content-Type` among the per-call headers,
/// `application/json` is added.
pub(crate) fn merge_headers(
    defaults: &HeaderMap,
    per_call: &Headers,
    default_json: bool,
) -> Result<HeaderMap> {
    let mut merged = defaults.clone();
    for (name, value) in per_call {
        let (name, value) = parse_header(name, value).map_err(HttpError::InvalidRequest)?;
        merged.insert(name, value);
    }

    let caller_set_content_type = per_call
        .keys()
        .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
    if default_json && !caller_set_content_type {
        merged.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(merged)
}

pub(crate) fn prepare<B>(
    method: Method,
    url: &str,
    body: Option<&B>,
    headers: HeaderMap,
) -> Result<PreparedRequest>
where
    B: Serialize + ?Sized,
{
    let body = match body {
        Some(value) => match serde_json::to_vec(value) {
            Ok(encoded) => Some(Bytes::from(encoded)),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %err, "failed to serialize request body");
                return Err(HttpError::Serialization(err));
            }
        },
        None => None,
    };

    let url = Url::parse(url).map_err(|err| {
        #[cfg(feature = "tracing")]
        tracing::error!(method = %method, url, error = %err, "failed to build http request");
        HttpError::InvalidRequest(format!("invalid url '{url}': {err}"))
    })?;

    Ok(PreparedRequest {
        method,
        url,
        headers,
        body,
    })
}

/// Sends one attempt and reads the whole body.
///
/// Cancellation while sending or reading yields [`HttpError::Cancelled`];
/// any other failure is [`HttpError::Transport`].
pub(crate) async fn dispatch(
    http: &reqwest::Client,
    scope: &CallScope,
    request: &PreparedRequest,
    attempt: usize,
) -> Result<Response> {
    #[cfg(not(feature = "tracing"))]
    let _ = attempt;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        method = %request.method,
        url = %request.url,
        attempt,
        "sending http request"
    );

    let mut builder = http
        .request(request.method.clone(), request.url.clone())
        .headers(request.headers.clone());
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    let received = scope
        .run(async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(Response::from_parts(status, headers, body))
        })
        .await;

    let received = match received {
        Ok(received) => received,
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                error = %err,
                "http request aborted"
            );
            return Err(err);
        }
    };

    match received {
        Ok(response) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                status = response.status().as_u16(),
                attempt,
                "http request completed"
            );
            Ok(response)
        }
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                method = %request.method,
                url = %request.url,
                attempt,
                error = %err,
                "http request failed"
            );
            Err(HttpError::Transport(err))
        }
    }
}
