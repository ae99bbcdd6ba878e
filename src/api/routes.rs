use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::response::internal_error_envelope;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_size as usize;

    let mut router = Router::new()
        // Internal
        .route("/_internal/health", get(handlers::health))
        .route("/_internal/invoke", post(handlers::invoke));

    // Signed downloads are only served when this process issues the signatures
    if state.url_signer.is_some() {
        router = router.route("/objects/:bucket/*key", get(handlers::serve_object));
    }

    router
        // Everything else goes through the dispatcher (/officers, /blogs, unknown paths)
        .fallback(handlers::dispatch_http)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Last-resort boundary: a panic anywhere in request handling still yields
/// the regular 500 envelope.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(error = %detail, "Request handler panicked");
    internal_error_envelope(detail).into_response()
}
