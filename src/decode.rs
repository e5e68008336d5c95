use serde::de::DeserializeOwned;

use crate::{Envelope, HttpError, Response, Result};

/// Fails with [`HttpError::Status`] when the status is outside `200..300`.
pub(crate) fn check_status(response: &Response) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        status = response.status().as_u16(),
        "response returned error status"
    );
    Err(HttpError::Status {
        status: response.status().as_u16(),
        body: response.text(),
    })
}

/// Turns a received response into a typed envelope.
///
/// The response is consumed exactly once whatever the outcome. Status and
/// decode failures carry the raw body.
pub(crate) fn decode_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>> {
    check_status(&response)?;

    let status = response.status();
    let body = response.into_body();
    match serde_json::from_slice::<T>(&body) {
        Ok(value) => Ok(Envelope {
            status,
            body,
            value,
        }),
        Err(err) => Err(HttpError::Decode {
            message: err.to_string(),
            body: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    decode_envelope(response).map(Envelope::into_value)
}
