use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::dispatch::InboundRequest;
use crate::api::response::{AppJson, Envelope};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Dispatch a raw gateway event and return the envelope itself as JSON.
/// Route: POST /_internal/invoke
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    AppJson(event): AppJson<InboundRequest>,
) -> Json<Envelope> {
    Json(state.dispatcher.handle(event).await)
}
