use std::sync::Arc;
use std::time::Duration;

use crate::object_store::ObjectStore;

/// Issues fresh, time-limited read links for stored objects.
pub struct LinkSigner {
    store: Arc<dyn ObjectStore>,
    expires_in: Duration,
}

impl LinkSigner {
    pub fn new(store: Arc<dyn ObjectStore>, expires_in: Duration) -> Self {
        Self { store, expires_in }
    }

    /// A signed URL for `bucket/key`, or `None` when signing fails. Failures
    /// are logged and never surface to the caller.
    pub async fn sign(&self, bucket: &str, key: &str) -> Option<String> {
        match self.store.presign_get(bucket, key, self.expires_in).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(bucket = %bucket, key = %key, error = %e, "Failed to sign object URL");
                None
            }
        }
    }
}
