use thiserror::Error;

/// Upper bound for signed URL lifetimes (7 days), matching what object stores accept.
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub collections: CollectionConfig,
    pub node: NodeConfig,
    pub storage: StorageConfig,
    /// Lifetime of every signed URL handed out, in seconds
    pub signed_url_ttl_secs: u64,
    /// Maximum request body size in bytes
    pub max_body_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
    pub instance_id: String,
}

/// Names of the two record collections and the containers holding their blobs.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub officers_table: String,
    pub blogs_table: String,
    pub officers_bucket: String,
    pub blogs_bucket: String,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Gcs,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for local storage backend
    pub local_storage_path: String,
    /// Prefix for signed URLs issued by the local backend
    pub public_base_url: String,
    /// HMAC secret for local signed URLs (random per process when unset)
    pub local_signing_secret: Option<String>,
    /// Path to GCS service account JSON (optional, defaults to the metadata server)
    pub gcs_credentials_file: Option<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            officers_table: "Officers".to_string(),
            blogs_table: "Blogs".to_string(),
            officers_bucket: "officers-profile-photos".to_string(),
            blogs_bucket: "blogs-markdown-files".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./files".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            local_signing_secret: None,
            gcs_credentials_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let instance_id =
            std::env::var("INSTANCE_ID").unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let defaults = CollectionConfig::default();
        let collections = CollectionConfig {
            officers_table: std::env::var("DYNAMODB_TABLE").unwrap_or(defaults.officers_table),
            blogs_table: std::env::var("BLOGS_TABLE").unwrap_or(defaults.blogs_table),
            officers_bucket: std::env::var("S3_BUCKET").unwrap_or(defaults.officers_bucket),
            blogs_bucket: std::env::var("BLOGS_BUCKET").unwrap_or(defaults.blogs_bucket),
        };

        let signed_url_ttl_secs = std::env::var("SIGNED_URL_TTL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let max_body_size = std::env::var("MAX_BODY_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024); // 10MB

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "gcs" => StorageBackend::Gcs,
            _ => StorageBackend::Local,
        };

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./files".to_string());
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let local_signing_secret = std::env::var("LOCAL_SIGNING_SECRET").ok();
        let gcs_credentials_file = std::env::var("GCS_CREDENTIALS_FILE").ok();

        let config = Config {
            collections,
            node: NodeConfig {
                instance_id,
                bind_address,
                data_dir,
            },
            storage: StorageConfig {
                backend: storage_backend,
                local_storage_path,
                public_base_url: public_base_url.trim_end_matches('/').to_string(),
                local_signing_secret,
                gcs_credentials_file,
            },
            signed_url_ttl_secs,
            max_body_size,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("DYNAMODB_TABLE", &self.collections.officers_table),
            ("BLOGS_TABLE", &self.collections.blogs_table),
            ("S3_BUCKET", &self.collections.officers_bucket),
            ("BLOGS_BUCKET", &self.collections.blogs_bucket),
        ];
        for (var, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{var} cannot be empty"
                )));
            }
        }

        if self.collections.officers_table == self.collections.blogs_table {
            return Err(ConfigError::ValidationError(
                "DYNAMODB_TABLE and BLOGS_TABLE must name different collections".to_string(),
            ));
        }

        if self.signed_url_ttl_secs == 0 || self.signed_url_ttl_secs > MAX_SIGNED_URL_TTL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "SIGNED_URL_TTL must be between 1 and {MAX_SIGNED_URL_TTL_SECS} seconds"
            )));
        }

        if matches!(self.storage.backend, StorageBackend::Gcs)
            && self.storage.gcs_credentials_file.is_none()
        {
            tracing::warn!(
                "GCS backend without GCS_CREDENTIALS_FILE: signed URLs cannot be generated \
                 and will be returned as null."
            );
        }

        Ok(())
    }
}
