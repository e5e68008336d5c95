use std::collections::BTreeMap;

use bytes::Bytes;
use reqwest::StatusCode;

/// Per-call headers. Applied over the client defaults; a key present in both
/// takes the per-call value.
pub type Headers = BTreeMap<String, String>;

/// Decoded JSON response together with the raw status and body.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope<T> {
    pub status: StatusCode,
    pub body: Bytes,
    pub value: T,
}

impl<T> Envelope<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}
