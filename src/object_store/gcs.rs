use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{encode_component, encode_key_path, ObjectStore, ObjectStoreError};

const STORAGE_HOST: &str = "storage.googleapis.com";
const SIGNING_ALGORITHM: &str = "GOOG4-RSA-SHA256";
/// Tokens are replaced this long before they expire.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;
/// Assumed lifetime when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Google Cloud Storage object store backend.
pub struct GcsStore {
    client: Client,
    access_token: tokio::sync::RwLock<AccessToken>,
    /// Present only when credentials come from a key file; required for signing.
    service_account: Option<ServiceAccountKey>,
}

#[derive(Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// A placeholder that is already stale, so the first use fetches a token.
    fn expired() -> Self {
        Self {
            value: String::new(),
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    fn from_response(resp: TokenResponse, now: DateTime<Utc>) -> Self {
        let lifetime = resp.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Self {
            value: resp.access_token,
            expires_at: now + chrono::Duration::seconds(lifetime),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

impl GcsStore {
    pub async fn new(credentials_file: Option<&str>) -> Result<Self, anyhow::Error> {
        let client = Client::builder().build()?;

        let service_account = match credentials_file {
            Some(path) => {
                let key_json = tokio::fs::read_to_string(path).await?;
                Some(serde_json::from_str::<ServiceAccountKey>(&key_json)?)
            }
            None => None,
        };

        let store = Self {
            client,
            access_token: tokio::sync::RwLock::new(AccessToken::expired()),
            service_account,
        };

        store.bearer_token().await?;
        Ok(store)
    }

    /// The current access token, refreshed first when it is close to expiry.
    async fn bearer_token(&self) -> Result<String, ObjectStoreError> {
        {
            let token = self.access_token.read().await;
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let mut token = self.access_token.write().await;
        // Another request may have refreshed it while we waited for the lock
        if !token.is_fresh(Utc::now()) {
            let started = Utc::now();
            let resp = self.fetch_token().await.map_err(|e| {
                ObjectStoreError::Backend(format!("Failed to refresh GCS access token: {e}"))
            })?;
            *token = AccessToken::from_response(resp, started);
            tracing::debug!(expires_at = %token.expires_at, "Refreshed GCS access token");
        }
        Ok(token.value.clone())
    }

    async fn fetch_token(&self) -> Result<TokenResponse, anyhow::Error> {
        match self.service_account {
            Some(ref key) => self.token_from_service_account(key).await,
            None => self.token_from_metadata_server().await,
        }
    }

    async fn token_from_service_account(
        &self,
        key: &ServiceAccountKey,
    ) -> Result<TokenResponse, anyhow::Error> {
        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "iss": key.client_email,
            "scope": "https://www.googleapis.com/auth/devstorage.read_write",
            "aud": key.token_uri,
            "iat": now,
            "exp": now + 3600,
        });

        // Build JWT (header.claims.signature)
        let header = base64_url_encode(&serde_json::to_vec(&serde_json::json!({
            "alg": "RS256",
            "typ": "JWT"
        }))?);
        let payload = base64_url_encode(&serde_json::to_vec(&claims)?);
        let unsigned = format!("{header}.{payload}");

        let signature = sign_rs256(unsigned.as_bytes(), &key.private_key)?;
        let jwt = format!("{unsigned}.{}", base64_url_encode(&signature));

        let resp: TokenResponse = self
            .client
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp)
    }

    async fn token_from_metadata_server(&self) -> Result<TokenResponse, anyhow::Error> {
        let resp: TokenResponse = self
            .client
            .get("http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token")
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp)
    }

    fn upload_url(bucket: &str, key: &str) -> String {
        format!(
            "https://{STORAGE_HOST}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            encode_component(bucket),
            encode_component(key)
        )
    }

    fn object_url(bucket: &str, key: &str) -> String {
        format!(
            "https://{STORAGE_HOST}/storage/v1/b/{}/o/{}?alt=media",
            encode_component(bucket),
            encode_component(key)
        )
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let token = self.bearer_token().await?;

        let resp = self
            .client
            .post(Self::upload_url(bucket, key))
            .bearer_auth(&token)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ObjectStoreError::Backend(format!(
                "GCS upload failed ({status}): {body}"
            )));
        }

        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError> {
        let token = self.bearer_token().await?;

        let resp = self
            .client
            .get(Self::object_url(bucket, key))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::NotFound(format!("{bucket}/{key}")));
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ObjectStoreError::Backend(format!(
                "GCS download failed ({status}): {body}"
            )));
        }

        let data = resp
            .bytes()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        Ok(data)
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        let account = self.service_account.as_ref().ok_or_else(|| {
            ObjectStoreError::Signing(
                "signed URLs require service account credentials (GCS_CREDENTIALS_FILE)"
                    .to_string(),
            )
        })?;

        let request = V4Request::new(&account.client_email, bucket, key, expires_in, Utc::now());
        let signature = sign_rs256(request.string_to_sign().as_bytes(), &account.private_key)
            .map_err(|e| ObjectStoreError::Signing(e.to_string()))?;

        Ok(request.url(&hex::encode(signature)))
    }
}

/// The pieces of a V4 signed GET request, before the signature is attached.
struct V4Request {
    path: String,
    query: String,
    scope: String,
    timestamp: String,
}

impl V4Request {
    fn new(
        client_email: &str,
        bucket: &str,
        key: &str,
        expires_in: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let datestamp = now.format("%Y%m%d").to_string();
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{datestamp}/auto/storage/goog4_request");
        let credential = format!("{client_email}/{scope}");

        // Parameters must be sorted by name.
        let query = [
            ("X-Goog-Algorithm", SIGNING_ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", timestamp.clone()),
            ("X-Goog-Expires", expires_in.as_secs().to_string()),
            ("X-Goog-SignedHeaders", "host".to_string()),
        ]
        .iter()
        .map(|(name, value)| format!("{name}={}", encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");

        Self {
            path: format!("/{}/{}", encode_component(bucket), encode_key_path(key)),
            query,
            scope,
            timestamp,
        }
    }

    fn canonical_request(&self) -> String {
        format!(
            "GET\n{}\n{}\nhost:{STORAGE_HOST}\n\nhost\nUNSIGNED-PAYLOAD",
            self.path, self.query
        )
    }

    fn string_to_sign(&self) -> String {
        let digest = ring::digest::digest(&ring::digest::SHA256, self.canonical_request().as_bytes());
        format!(
            "{SIGNING_ALGORITHM}\n{}\n{}\n{}",
            self.timestamp,
            self.scope,
            hex::encode(digest.as_ref())
        )
    }

    fn url(&self, signature_hex: &str) -> String {
        format!(
            "https://{STORAGE_HOST}{}?{}&X-Goog-Signature={signature_hex}",
            self.path, self.query
        )
    }
}

fn base64_url_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn sign_rs256(data: &[u8], private_key_pem: &str) -> Result<Vec<u8>, anyhow::Error> {
    // Strip PEM armor and decode the base64 body to PKCS#8 DER
    let der_b64: String = private_key_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    let der = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, der_b64.trim())?;

    let key_pair = ring::signature::RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| anyhow::anyhow!("Failed to parse RSA key: {e}"))?;

    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            data,
            &mut signature,
        )
        .map_err(|e| anyhow::anyhow!("Failed to sign: {e}"))?;

    Ok(signature)
}
