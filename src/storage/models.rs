use serde::{Deserialize, Serialize};

/// A record as stored: an attribute map whose shape is owned by whoever wrote it.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A named collection of records, uniquely keyed by one string attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub key_attribute: &'static str,
}

impl Collection {
    pub const OFFICER_KEY: &'static str = "OfficerID";
    pub const BLOG_KEY: &'static str = "BlogID";

    pub fn officers(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_attribute: Self::OFFICER_KEY,
        }
    }

    pub fn blogs(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_attribute: Self::BLOG_KEY,
        }
    }

    /// The record's key, if it carries one as a string.
    pub fn key_of<'a>(&self, record: &'a Record) -> Option<&'a str> {
        record.get(self.key_attribute).and_then(|v| v.as_str())
    }
}

/// Object key of an officer's photo.
pub fn photo_key(officer_id: &str) -> String {
    format!("{officer_id}.jpg")
}

/// Object key of a blog's markdown body.
pub fn markdown_key(blog_id: &str) -> String {
    format!("{blog_id}.md")
}

/// A blog entry as written by the create path. The body lives in the object
/// store under `s3_key`, never in the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogRecord {
    #[serde(rename = "BlogID")]
    pub blog_id: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "S3Key")]
    pub s3_key: String,
}

impl BlogRecord {
    pub fn new(blog_id: &str, author: &str, title: &str) -> Self {
        Self {
            blog_id: blog_id.to_string(),
            author: author.to_string(),
            title: title.to_string(),
            s3_key: markdown_key(blog_id),
        }
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("BlogID".into(), self.blog_id.clone().into());
        record.insert("Author".into(), self.author.clone().into());
        record.insert("Title".into(), self.title.clone().into());
        record.insert("S3Key".into(), self.s3_key.clone().into());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_record_derives_key() {
        let blog = BlogRecord::new("B1", "Ann", "Hello");
        assert_eq!(blog.s3_key, "B1.md");
        assert_eq!(blog.to_record()["S3Key"], "B1.md");
    }

    #[test]
    fn test_blog_record_serializes_with_store_names() {
        let blog = BlogRecord::new("B1", "Ann", "Hello");
        let value = serde_json::to_value(&blog).unwrap();
        assert_eq!(value, serde_json::Value::Object(blog.to_record()));
    }

    #[test]
    fn test_key_of() {
        let officers = Collection::officers("Officers");
        let mut record = Record::new();
        assert_eq!(officers.key_of(&record), None);
        record.insert("OfficerID".into(), 7.into());
        assert_eq!(officers.key_of(&record), None);
        record.insert("OfficerID".into(), "O7".into());
        assert_eq!(officers.key_of(&record), Some("O7"));
    }

    #[test]
    fn test_object_keys() {
        assert_eq!(photo_key("O1"), "O1.jpg");
        assert_eq!(markdown_key("B1"), "B1.md");
    }
}
