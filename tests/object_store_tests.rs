use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use portal_api::object_store::{LocalStore, ObjectStore, ObjectStoreError, UrlSigner};

const BASE_URL: &str = "http://files.test";

fn test_store() -> (tempfile::TempDir, LocalStore, Arc<UrlSigner>) {
    let dir = tempfile::tempdir().unwrap();
    let signer = Arc::new(UrlSigner::from_secret(b"secret"));
    let store = LocalStore::new(dir.path(), BASE_URL, Arc::clone(&signer)).unwrap();
    (dir, store, signer)
}

/// Split a local signed URL into (path, expires, signature).
fn parse_signed(url: &str) -> (String, i64, String) {
    let rest = url.strip_prefix(BASE_URL).expect("URL should use the base URL");
    let (path, query) = rest.split_once('?').expect("URL should carry a query");
    let mut expires = None;
    let mut signature = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("expires", v)) => expires = Some(v.parse().unwrap()),
            Some(("signature", v)) => signature = Some(v.to_string()),
            _ => {}
        }
    }
    (path.to_string(), expires.unwrap(), signature.unwrap())
}

#[tokio::test]
async fn test_local_store_put_get() {
    let (_dir, store, _) = test_store();

    let data = Bytes::from("hello world");
    store.put("blogs", "B1.md", data.clone()).await.unwrap();

    let retrieved = store.get("blogs", "B1.md").await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let (_dir, store, _) = test_store();

    let result = store.get("blogs", "missing.md").await;
    assert!(matches!(result, Err(ObjectStoreError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_overwrite() {
    let (_dir, store, _) = test_store();

    store.put("blogs", "key", Bytes::from("first")).await.unwrap();
    store.put("blogs", "key", Bytes::from("second")).await.unwrap();

    let data = store.get("blogs", "key").await.unwrap();
    assert_eq!(data, Bytes::from("second"));
}

#[tokio::test]
async fn test_local_store_buckets_are_isolated() {
    let (_dir, store, _) = test_store();

    store.put("photos", "same", Bytes::from("photo")).await.unwrap();
    assert!(matches!(
        store.get("blogs", "same").await,
        Err(ObjectStoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_local_store_nested_keys() {
    let (_dir, store, _) = test_store();

    store
        .put("blogs", "2024/03/post.md", Bytes::from("nested"))
        .await
        .unwrap();
    assert_eq!(
        store.get("blogs", "2024/03/post.md").await.unwrap(),
        Bytes::from("nested")
    );
}

#[tokio::test]
async fn test_local_store_rejects_traversal() {
    let (_dir, store, _) = test_store();

    for key in ["../escape", "a/../../b", "/abs", "", "a\\b"] {
        let result = store.put("blogs", key, Bytes::from("x")).await;
        assert!(
            matches!(result, Err(ObjectStoreError::InvalidKey(_))),
            "key {key:?} should be rejected"
        );
    }
    for bucket in ["..", "a/b", ""] {
        let result = store.get(bucket, "k").await;
        assert!(
            matches!(result, Err(ObjectStoreError::InvalidKey(_))),
            "bucket {bucket:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_presign_get_url_shape() {
    let (_dir, store, signer) = test_store();

    let before = chrono::Utc::now().timestamp();
    let url = store
        .presign_get("photos", "O1.jpg", Duration::from_secs(60))
        .await
        .unwrap();
    let (path, expires, signature) = parse_signed(&url);

    assert_eq!(path, "/objects/photos/O1.jpg");
    assert!(expires >= before + 60 && expires <= before + 61);
    assert!(signer.verify("photos", "O1.jpg", expires, &signature));
}

#[tokio::test]
async fn test_presign_get_does_not_require_object() {
    let (_dir, store, _) = test_store();

    let url = store
        .presign_get("photos", "never-uploaded.jpg", Duration::from_secs(60))
        .await;
    assert!(url.is_ok());
}

#[tokio::test]
async fn test_presign_get_encodes_key() {
    let (_dir, store, _) = test_store();

    let url = store
        .presign_get("photos", "team a/O 1.jpg", Duration::from_secs(60))
        .await
        .unwrap();
    let (path, _, _) = parse_signed(&url);
    assert_eq!(path, "/objects/photos/team%20a/O%201.jpg");
}

#[tokio::test]
async fn test_presign_get_same_key_twice() {
    let (_dir, store, _) = test_store();

    let first = store
        .presign_get("photos", "O1.jpg", Duration::from_secs(60))
        .await
        .unwrap();
    let second = store
        .presign_get("photos", "O1.jpg", Duration::from_secs(120))
        .await
        .unwrap();

    let (first_path, first_expires, _) = parse_signed(&first);
    let (second_path, second_expires, _) = parse_signed(&second);
    assert_eq!(first_path, second_path);
    assert!(second_expires > first_expires);
}

#[tokio::test]
async fn test_presign_get_rejects_invalid_key() {
    let (_dir, store, _) = test_store();

    let result = store
        .presign_get("photos", "../secret", Duration::from_secs(60))
        .await;
    assert!(matches!(result, Err(ObjectStoreError::InvalidKey(_))));
}
