use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use super::compose::log_response;
use super::handlers::{blogs, officers};
use super::links::LinkSigner;
use super::response::{ApiError, Envelope};
use crate::config::CollectionConfig;
use crate::object_store::ObjectStore;
use crate::storage::{Collection, RecordStore};

// ============================================================================
// Inbound request
// ============================================================================

/// A request in API-gateway proxy shape. Native HTTP requests are converted
/// into this form, and raw events arrive in it directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl InboundRequest {
    /// The request method; events without one are treated as POST when they
    /// carry a body and GET otherwise.
    pub fn method(&self) -> String {
        match self.http_method {
            Some(ref method) => method.to_ascii_uppercase(),
            None if self.body.is_some() => "POST".to_string(),
            None => "GET".to_string(),
        }
    }
}

// ============================================================================
// Route table
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ListOfficers,
    GetOfficer(String),
    ListBlogs,
    GetBlog { id: String, include_content: bool },
    CreateBlog,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unroutable {
    #[error("Path {0} not found")]
    UnknownPath(String),
    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },
}

impl From<Unroutable> for ApiError {
    fn from(e: Unroutable) -> Self {
        match e {
            Unroutable::UnknownPath(_) => ApiError::not_found(e.to_string()),
            Unroutable::MethodNotAllowed { .. } => ApiError::method_not_allowed(e.to_string()),
        }
    }
}

/// Query flag that asks for the markdown body inline on single-blog fetches.
pub const INCLUDE_CONTENT_PARAM: &str = "IncludeContent";

impl Route {
    pub fn resolve(
        method: &str,
        path: &str,
        query: &HashMap<String, String>,
    ) -> Result<Route, Unroutable> {
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        let method = method.to_ascii_uppercase();

        match (method.as_str(), path) {
            ("GET", "/officers") => Ok(match query.get(Collection::OFFICER_KEY) {
                Some(id) => Route::GetOfficer(id.clone()),
                None => Route::ListOfficers,
            }),
            ("GET", "/blogs") => Ok(match query.get(Collection::BLOG_KEY) {
                Some(id) => Route::GetBlog {
                    id: id.clone(),
                    include_content: query
                        .get(INCLUDE_CONTENT_PARAM)
                        .is_some_and(|v| is_truthy(v)),
                },
                None => Route::ListBlogs,
            }),
            ("POST", "/blogs") => Ok(Route::CreateBlog),
            (_, "/officers" | "/blogs") => Err(Unroutable::MethodNotAllowed {
                method,
                path: path.to_string(),
            }),
            _ => Err(Unroutable::UnknownPath(path.to_string())),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Stateless request dispatcher over injected store handles.
pub struct Dispatcher {
    pub(crate) records: Arc<dyn RecordStore>,
    pub(crate) objects: Arc<dyn ObjectStore>,
    pub(crate) links: LinkSigner,
    pub(crate) officers: Collection,
    pub(crate) blogs: Collection,
    pub(crate) officers_bucket: String,
    pub(crate) blogs_bucket: String,
}

impl Dispatcher {
    pub fn new(
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        collections: &CollectionConfig,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            records,
            links: LinkSigner::new(Arc::clone(&objects), signed_url_ttl),
            objects,
            officers: Collection::officers(&collections.officers_table),
            blogs: Collection::blogs(&collections.blogs_table),
            officers_bucket: collections.officers_bucket.clone(),
            blogs_bucket: collections.blogs_bucket.clone(),
        }
    }

    /// Handle one request. Never fails: every error, expected or not, is
    /// rendered into the returned envelope.
    pub async fn handle(&self, request: InboundRequest) -> Envelope {
        let method = request.method();
        let query = request.query_string_parameters.unwrap_or_default();
        info!(method = %method, path = %request.resource, query = ?query, "Dispatching request");

        let result = match Route::resolve(&method, &request.resource, &query) {
            Ok(route) => self.execute(route, request.body.as_deref()).await,
            Err(unroutable) => Err(unroutable.into()),
        };

        let envelope = result.unwrap_or_else(|e| {
            if let ApiError::Internal(ref detail) = e {
                error!(method = %method, path = %request.resource, error = %detail, "Request failed");
            }
            e.into_envelope()
        });

        log_response(&envelope);
        envelope
    }

    async fn execute(&self, route: Route, body: Option<&str>) -> Result<Envelope, ApiError> {
        match route {
            Route::ListOfficers => officers::list_officers(self).await,
            Route::GetOfficer(id) => officers::get_officer(self, &id).await,
            Route::ListBlogs => blogs::list_blogs(self).await,
            Route::GetBlog {
                id,
                include_content,
            } => blogs::get_blog(self, &id, include_content).await,
            Route::CreateBlog => blogs::create_blog(self, body).await,
        }
    }
}
