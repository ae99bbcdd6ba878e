//! Shared test helpers for unit tests.

use std::sync::Arc;

use crate::config::{CollectionConfig, Config, NodeConfig, StorageConfig};
use crate::object_store::{LocalStore, UrlSigner};
use crate::storage::Database;
use crate::AppState;

/// Create a test AppState with a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("files");

    let config = Config {
        collections: CollectionConfig::default(),
        node: NodeConfig {
            instance_id: uuid::Uuid::new_v4().to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig::default(),
        signed_url_ttl_secs: 60,
        max_body_size: 1024 * 1024,
    };

    let db = Database::open(
        &data_dir,
        &[
            config.collections.officers_table.as_str(),
            config.collections.blogs_table.as_str(),
        ],
    )
    .expect("Failed to open test database");

    let signer = Arc::new(UrlSigner::from_secret(b"test-secret"));
    let object_store = LocalStore::new(
        &files_dir,
        &config.storage.public_base_url,
        Arc::clone(&signer),
    )
    .expect("Failed to create test object store");

    Arc::new(AppState::new(
        config,
        Arc::new(db),
        Arc::new(object_store),
        Some(signer),
    ))
}
