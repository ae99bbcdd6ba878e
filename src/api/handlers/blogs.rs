use bytes::Bytes;
use serde_json::Value;

use crate::api::compose::{attach_url, CONTENT_FIELD, MARKDOWN_URL_FIELD};
use crate::api::dispatch::Dispatcher;
use crate::api::response::{ApiError, Envelope, MessageBody};
use crate::storage::models::{markdown_key, BlogRecord};
use crate::storage::Record;

const REQUIRED_FIELDS: [&str; 4] = ["BlogID", "Author", "Title", "Content"];

pub(crate) async fn list_blogs(d: &Dispatcher) -> Result<Envelope, ApiError> {
    let mut blogs = d.records.scan(&d.blogs)?;
    for blog in &mut blogs {
        attach_markdown_url(d, blog).await;
    }

    tracing::debug!(count = blogs.len(), "Listed blogs");
    Envelope::ok(&blogs)
}

pub(crate) async fn get_blog(
    d: &Dispatcher,
    blog_id: &str,
    include_content: bool,
) -> Result<Envelope, ApiError> {
    let mut blog = d
        .records
        .get_item(&d.blogs, blog_id)?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;

    attach_markdown_url(d, &mut blog).await;
    if include_content {
        let content = read_content(d, &markdown_key(blog_id)).await;
        blog.insert(CONTENT_FIELD.to_string(), Value::String(content));
    }

    Envelope::ok(&blog)
}

pub(crate) async fn create_blog(d: &Dispatcher, body: Option<&str>) -> Result<Envelope, ApiError> {
    let body: Value = match body.filter(|b| !b.trim().is_empty()) {
        Some(text) => serde_json::from_str(text)
            .map_err(|_| ApiError::bad_request("Malformed JSON in request body"))?,
        None => Value::Object(Record::new()),
    };
    let fields = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Request body must be a JSON object"))?;

    let (Some(blog_id), Some(author), Some(title), Some(content)) = (
        required_str(fields, "BlogID"),
        required_str(fields, "Author"),
        required_str(fields, "Title"),
        required_str(fields, "Content"),
    ) else {
        let missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|f| required_str(fields, f).is_none())
            .collect();
        return Err(ApiError::bad_request(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    let blog = BlogRecord::new(blog_id, author, title);

    // Content goes first; a record must never point at content that was not written.
    if let Err(e) = d
        .objects
        .put(
            &d.blogs_bucket,
            &blog.s3_key,
            Bytes::copy_from_slice(content.as_bytes()),
        )
        .await
    {
        tracing::error!(blog_id = %blog_id, error = %e, "Failed to write blog content");
        return Err(ApiError::upload(e.to_string()));
    }

    if let Err(e) = d.records.put_item(&d.blogs, &blog.to_record()) {
        tracing::error!(
            blog_id = %blog_id,
            key = %blog.s3_key,
            error = %e,
            "Failed to write blog record; content object is orphaned"
        );
        return Err(ApiError::upload(e.to_string()));
    }

    tracing::info!(blog_id = %blog_id, key = %blog.s3_key, "Created blog");
    Envelope::ok(&MessageBody::new("Blog uploaded successfully"))
}

async fn attach_markdown_url(d: &Dispatcher, blog: &mut Record) {
    let url = match d.blogs.key_of(blog) {
        Some(id) => d.links.sign(&d.blogs_bucket, &markdown_key(id)).await,
        None => None,
    };
    attach_url(blog, MARKDOWN_URL_FIELD, url);
}

/// The markdown body as text, or a description of why it could not be read.
async fn read_content(d: &Dispatcher, key: &str) -> String {
    let result = match d.objects.get(&d.blogs_bucket, key).await {
        Ok(data) => String::from_utf8(data.to_vec()).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    result.unwrap_or_else(|e| {
        tracing::warn!(key = %key, error = %e, "Failed to read blog content");
        format!("Error retrieving blog content: {e}")
    })
}

/// A field that is present, a string and not empty.
fn required_str<'a>(fields: &'a Record, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;

    #[test]
    fn test_required_str() {
        let fields: Record = serde_json::from_str(
            r#"{"BlogID": "B1", "Author": "", "Title": 3, "Content": null}"#,
        )
        .unwrap();
        assert_eq!(required_str(&fields, "BlogID"), Some("B1"));
        assert_eq!(required_str(&fields, "Author"), None);
        assert_eq!(required_str(&fields, "Title"), None);
        assert_eq!(required_str(&fields, "Content"), None);
        assert_eq!(required_str(&fields, "Missing"), None);
    }

    #[tokio::test]
    async fn test_read_content_returns_text() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let d = &state.dispatcher;
        d.objects
            .put(&d.blogs_bucket, "B1.md", Bytes::from("# Hello"))
            .await
            .unwrap();

        assert_eq!(read_content(d, "B1.md").await, "# Hello");
    }

    #[tokio::test]
    async fn test_read_content_embeds_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let content = read_content(&state.dispatcher, "missing.md").await;
        assert!(content.starts_with("Error retrieving blog content: "));
        assert!(content.contains("missing.md"));
    }

    #[tokio::test]
    async fn test_read_content_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let d = &state.dispatcher;
        d.objects
            .put(&d.blogs_bucket, "bin.md", Bytes::from_static(&[0xff, 0xfe]))
            .await
            .unwrap();

        assert!(read_content(d, "bin.md")
            .await
            .starts_with("Error retrieving blog content: "));
    }
}
