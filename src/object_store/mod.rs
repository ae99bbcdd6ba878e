mod gcs;
mod local;
mod signing;

pub use gcs::GcsStore;
pub use local::LocalStore;
pub use signing::UrlSigner;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// RFC 3986 unreserved characters pass through; everything else is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Signing error: {0}")]
    Signing(String),
}

/// Abstraction over object storage backends.
/// Objects are addressed by container (bucket) and key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError>;

    /// Build a URL granting read access to `bucket/key` until `now + expires_in`.
    /// The object does not have to exist.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError>;
}

/// Percent-encode a single URL component (query value or path segment).
pub(crate) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Percent-encode an object key for use in a URL path, keeping `/` separators.
pub(crate) fn encode_key_path(key: &str) -> String {
    key.split('/')
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/")
}
