use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::object_store::ObjectStoreError;
use crate::storage::DatabaseError;

// ============================================================================
// Response envelope
// ============================================================================

/// The `{statusCode, body}` shape every dispatched request resolves to.
/// `body` is already-serialized JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    pub body: String,
}

impl Envelope {
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body)
            .map_err(|e| ApiError::internal(format!("Failed to serialize response: {e}")))?;
        Ok(Envelope {
            status_code: status.as_u16(),
            body,
        })
    }

    pub fn ok<T: Serialize + ?Sized>(body: &T) -> Result<Self, ApiError> {
        Self::json(StatusCode::OK, body)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Build an envelope from a body that cannot fail to serialize.
    fn from_message(status: StatusCode, body: &MessageBody) -> Self {
        Envelope {
            status_code: status.as_u16(),
            body: serde_json::to_string(body)
                .unwrap_or_else(|_| r#"{"message":"Internal server error"}"#.to_string()),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            self.body,
        )
            .into_response()
    }
}

// ============================================================================
// Message bodies
// ============================================================================

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        MessageBody {
            message: message.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Unified error type for handlers
// ============================================================================

/// Everything a handler can fail with, already classified by response.
#[derive(Debug)]
pub enum ApiError {
    /// Client-side problem (4xx) with a message.
    Fail(StatusCode, String),
    /// A store write on the create path failed (500, detail under `error`).
    Upload(String),
    /// Anything else that escaped a handler (500, detail under `details`).
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::BAD_REQUEST, message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::FORBIDDEN, message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::NOT_FOUND, message.into())
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::METHOD_NOT_ALLOWED, message.into())
    }

    pub fn upload(detail: impl Into<String>) -> Self {
        ApiError::Upload(detail.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::Internal(detail.into())
    }

    pub fn into_envelope(self) -> Envelope {
        match self {
            ApiError::Fail(code, message) => Envelope::from_message(code, &MessageBody::new(message)),
            ApiError::Upload(detail) => Envelope::from_message(
                StatusCode::INTERNAL_SERVER_ERROR,
                &MessageBody {
                    error: Some(detail),
                    ..MessageBody::new("Failed to upload blog")
                },
            ),
            ApiError::Internal(detail) => internal_error_envelope(detail),
        }
    }
}

/// The 500 envelope produced by the top-level error boundary.
pub fn internal_error_envelope(detail: impl Into<String>) -> Envelope {
    Envelope::from_message(
        StatusCode::INTERNAL_SERVER_ERROR,
        &MessageBody {
            details: Some(detail.into()),
            ..MessageBody::new("Internal server error")
        },
    )
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        ApiError::internal(e.to_string())
    }
}

impl From<ObjectStoreError> for ApiError {
    fn from(e: ObjectStoreError) -> Self {
        ApiError::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_envelope().into_response()
    }
}

// ============================================================================
// Custom extractors (reject with envelope-formatted ApiError)
// ============================================================================

/// Drop-in replacement for `axum::Json` that rejects with an envelope.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        format!("Invalid request body: {}", err.body_text())
                    }
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON in request body".into(),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing Content-Type: application/json header".into()
                    }
                    _ => "Failed to read request body".into(),
                };
                Err(ApiError::bad_request(message))
            }
        }
    }
}

/// Drop-in replacement for `axum::extract::Query` that rejects with an envelope.
pub struct AppQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, ApiError> {
        let query = parts.uri.query().unwrap_or_default();
        serde_qs::from_str(query)
            .map(AppQuery)
            .map_err(|e| ApiError::bad_request(friendly_query_error(&e.to_string())))
    }
}

/// Like [`AppQuery`] but without bracket nesting: `a[b]=x` is the flat key
/// `a[b]`. Used where parameters are forwarded as a plain string map.
pub struct FlatQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for FlatQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, ApiError> {
        parse_flat_query(parts.uri.query().unwrap_or_default()).map(FlatQuery)
    }
}

fn parse_flat_query<T: DeserializeOwned>(query: &str) -> Result<T, ApiError> {
    serde_qs::Config::new()
        .max_depth(0)
        .deserialize_str(query)
        .map_err(|e| ApiError::bad_request(friendly_query_error(&e.to_string())))
}

/// Translate serde/serde_qs error messages into human-friendly descriptions.
fn friendly_query_error(raw: &str) -> String {
    let cleaned = raw
        .replace("u32", "non-negative integer")
        .replace("u64", "non-negative integer")
        .replace("i32", "integer")
        .replace("i64", "integer");

    format!("Invalid query parameter: {cleaned}")
}
