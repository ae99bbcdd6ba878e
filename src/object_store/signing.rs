use base64::Engine;
use ring::hmac;

use super::ObjectStoreError;

/// HMAC-SHA256 signer for URLs served by the local backend's download route.
///
/// A signature covers the bucket, the key and the expiry timestamp, so none
/// of them can be altered without invalidating the URL.
pub struct UrlSigner {
    key: hmac::Key,
}

impl UrlSigner {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }

    /// Signer with a random key; URLs it issues die with the process.
    pub fn random() -> Result<Self, ObjectStoreError> {
        let rng = ring::rand::SystemRandom::new();
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng)
            .map_err(|_| ObjectStoreError::Signing("failed to generate signing key".to_string()))?;
        Ok(Self { key })
    }

    pub fn sign(&self, bucket: &str, key: &str, expires_at: i64) -> String {
        let tag = hmac::sign(&self.key, message(bucket, key, expires_at).as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(tag.as_ref())
    }

    /// Constant-time check of `signature`. Expiry is checked by the caller.
    pub fn verify(&self, bucket: &str, key: &str, expires_at: i64, signature: &str) -> bool {
        let Ok(tag) = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        hmac::verify(&self.key, message(bucket, key, expires_at).as_bytes(), &tag).is_ok()
    }
}

fn message(bucket: &str, key: &str, expires_at: i64) -> String {
    format!("GET\n{bucket}\n{key}\n{expires_at}")
}
