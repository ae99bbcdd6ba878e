use serde_json::Value;

use super::response::Envelope;
use crate::storage::Record;

pub const PHOTO_URL_FIELD: &str = "PhotoS3URL";
pub const MARKDOWN_URL_FIELD: &str = "MarkdownS3URL";
pub const CONTENT_FIELD: &str = "Content";

/// Set `field` to the URL, or to `null` when there is none. The field is
/// always present afterwards.
pub fn attach_url(record: &mut Record, field: &str, url: Option<String>) {
    record.insert(field.to_string(), url.map_or(Value::Null, Value::String));
}

pub fn log_response(envelope: &Envelope) {
    tracing::debug!(
        status = envelope.status_code,
        body_len = envelope.body.len(),
        body = %envelope.body,
        "Response"
    );
}
