use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{encode_component, encode_key_path, ObjectStore, ObjectStoreError, UrlSigner};

/// Local filesystem object store for development and testing.
///
/// Each bucket is a directory under `base_path`. Signed URLs point at this
/// service's own `/objects/{bucket}/{key}` route.
pub struct LocalStore {
    base_path: PathBuf,
    public_base_url: String,
    signer: Arc<UrlSigner>,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(
        base_path: P,
        public_base_url: &str,
        signer: Arc<UrlSigner>,
    ) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, ObjectStoreError> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(ObjectStoreError::InvalidKey(format!("{bucket}/{key}")));
        }
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && !key.contains('\\')
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(bucket).join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound(format!("{bucket}/{key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        self.object_path(bucket, key)?;
        let ttl = i64::try_from(expires_in.as_secs())
            .map_err(|_| ObjectStoreError::Signing("expiration out of range".to_string()))?;
        let expires_at = chrono::Utc::now().timestamp() + ttl;
        let signature = self.signer.sign(bucket, key, expires_at);

        Ok(format!(
            "{}/objects/{}/{}?expires={expires_at}&signature={signature}",
            self.public_base_url,
            encode_component(bucket),
            encode_key_path(key),
        ))
    }
}
