use bytes::Bytes;
use reqwest::{header::HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::{decode, Result};

/// A fully received HTTP response: status, headers and body bytes.
///
/// The body is read to completion by the dispatcher, so a `Response` holds no
/// connection resources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::from_parts(status, HeaderMap::new(), body.into())
    }

    pub(crate) fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Converts a non-2xx response into [`crate::HttpError::Status`].
    pub fn error_for_status(self) -> Result<Self> {
        decode::check_status(&self)?;
        Ok(self)
    }

    /// Validates the status and decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        decode::decode_json(self)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::Response;

    #[test]
    fn text_is_lossy() {
        let response = Response::new(StatusCode::OK, vec![b'o', b'k', 0xff]);
        assert_eq!(response.text(), "ok\u{fffd}");
    }

    #[test]
    fn error_for_status_keeps_success() {
        let response = Response::new(StatusCode::NO_CONTENT, "");
        assert!(response.error_for_status().is_ok());
    }

    #[test]
    fn error_for_status_carries_body() {
        let err = Response::new(StatusCode::BAD_GATEWAY, "upstream down")
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(err.body(), Some("upstream down"));
    }
}
