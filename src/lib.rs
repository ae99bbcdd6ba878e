//! portal-api - Officer roster and blog API with time-limited media links
//!
//! This crate serves two record collections with:
//! - redb embedded database for records (one table per collection)
//! - Swappable object storage backends (local filesystem, GCS)
//! - Short-lived signed URLs attached to every record read
//! - A single dispatcher reachable over HTTP or as gateway-style events

pub mod api;
pub mod config;
pub mod object_store;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;
use std::time::Duration;

use api::Dispatcher;
use config::Config;
use object_store::{ObjectStore, UrlSigner};
use storage::RecordStore;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub dispatcher: Dispatcher,
    pub object_store: Arc<dyn ObjectStore>,
    /// Set when the local backend signs its own download URLs
    pub url_signer: Option<Arc<UrlSigner>>,
}

impl AppState {
    pub fn new(
        config: Config,
        records: Arc<dyn RecordStore>,
        object_store: Arc<dyn ObjectStore>,
        url_signer: Option<Arc<UrlSigner>>,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            records,
            Arc::clone(&object_store),
            &config.collections,
            Duration::from_secs(config.signed_url_ttl_secs),
        );
        Self {
            config,
            dispatcher,
            object_store,
            url_signer,
        }
    }
}
