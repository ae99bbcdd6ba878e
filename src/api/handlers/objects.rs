use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery};
use crate::object_store::ObjectStoreError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignedParams {
    pub expires: i64,
    pub signature: String,
}

/// Serve object content behind a locally signed URL.
/// Route: GET /objects/:bucket/*key
pub async fn serve_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    AppQuery(params): AppQuery<SignedParams>,
) -> Result<Response, ApiError> {
    let signer = state
        .url_signer
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Signed downloads are not served by this backend"))?;

    let now = chrono::Utc::now().timestamp();
    if params.expires < now || !signer.verify(&bucket, &key, params.expires, &params.signature) {
        tracing::debug!(bucket = %bucket, key = %key, "Rejected signed download");
        return Err(ApiError::forbidden("Invalid or expired signature"));
    }

    let data = state
        .object_store
        .get(&bucket, &key)
        .await
        .map_err(|e| match e {
            ObjectStoreError::NotFound(_) => ApiError::not_found("Object not found"),
            ObjectStoreError::InvalidKey(_) => ApiError::bad_request(e.to_string()),
            _ => ApiError::internal(format!("Failed to retrieve object: {e}")),
        })?;

    let content_type = mime_guess::from_path(&key).first_or_octet_stream();
    let byte_size = data.len() as u64;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        content_type
            .as_ref()
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(byte_size));

    let filename = key.rsplit('/').next().unwrap_or(&key);
    if let Ok(value) = format!("inline; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Never cache past the link's own lifetime
    let remaining = (params.expires - now).max(0);
    if let Ok(value) = format!("private, max-age={remaining}").parse() {
        headers.insert(header::CACHE_CONTROL, value);
    }

    Ok(response)
}
