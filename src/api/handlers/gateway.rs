use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, Uri};
use bytes::Bytes;

use crate::api::dispatch::InboundRequest;
use crate::api::response::{ApiError, Envelope, FlatQuery};
use crate::AppState;

/// Turn a native HTTP request into an [`InboundRequest`] and dispatch it.
/// Serves every path without a dedicated route.
pub async fn dispatch_http(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    FlatQuery(query): FlatQuery<HashMap<String, String>>,
    body: Bytes,
) -> Result<Envelope, ApiError> {
    let body = if body.is_empty() {
        None
    } else {
        Some(
            String::from_utf8(body.to_vec())
                .map_err(|_| ApiError::bad_request("Request body must be UTF-8 text"))?,
        )
    };

    let request = InboundRequest {
        http_method: Some(method.to_string()),
        resource: uri.path().to_string(),
        query_string_parameters: (!query.is_empty()).then_some(query),
        body,
    };

    Ok(state.dispatcher.handle(request).await)
}
