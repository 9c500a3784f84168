//! Object store access for product images
//!
//! Only presigned URLs are issued here; the bytes never pass through the
//! service. Uploads land under `images/<uuid>_<filename>` and hits reference
//! their image by the `<uuid>_<filename>` part, stored as `file_name`.

mod s3;

pub use s3::S3UrlSigner;

use crate::search::SearchResult;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

const IMAGE_PREFIX: &str = "images";

/// Issues time-limited URLs against the object store
#[async_trait]
pub trait UrlSigner: Send + Sync + 'static {
    /// URL permitting a GET of `key`
    async fn presign_get(&self, key: &str) -> SearchResult<String>;

    /// URL permitting a PUT of `key`
    async fn presign_put(&self, key: &str, content_type: Option<&str>) -> SearchResult<String>;
}

/// Key under which an uploaded image is stored
pub fn upload_key(filename: &str) -> String {
    format!("{}/{}_{}", IMAGE_PREFIX, Uuid::new_v4(), filename)
}

/// Key of a stored image referenced by a document's `file_name`
pub fn retrieval_key(file_name: &str) -> String {
    format!("{}/{}", IMAGE_PREFIX, file_name)
}

/// Result of the presigned-url operation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PresignedUpload {
    /// URL the client PUTs the image to
    pub url: String,
    /// Full object key
    pub key: String,
    /// Value to store as the document's `file_name`
    pub file_name: String,
}

/// Issue a presigned upload for `filename`
pub async fn presign_upload(
    signer: &dyn UrlSigner,
    filename: &str,
    content_type: Option<&str>,
) -> SearchResult<PresignedUpload> {
    let key = upload_key(filename);
    let url = signer.presign_put(&key, content_type).await?;
    let file_name = key
        .strip_prefix(IMAGE_PREFIX)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(&key)
        .to_string();
    Ok(PresignedUpload { url, key, file_name })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoSigner;

    #[async_trait]
    impl UrlSigner for EchoSigner {
        async fn presign_get(&self, key: &str) -> SearchResult<String> {
            Ok(format!("https://bucket.example/{}?sig=get", key))
        }

        async fn presign_put(&self, key: &str, _content_type: Option<&str>) -> SearchResult<String> {
            Ok(format!("https://bucket.example/{}?sig=put", key))
        }
    }

    #[test]
    fn test_key_scheme() {
        let key = upload_key("shoe.png");
        assert!(key.starts_with("images/"));
        assert!(key.ends_with("_shoe.png"));
        assert_eq!(retrieval_key("abc_shoe.png"), "images/abc_shoe.png");
    }

    #[tokio::test]
    async fn test_presign_upload_derives_file_name() {
        let upload = presign_upload(&EchoSigner, "shoe.png", Some("image/png"))
            .await
            .unwrap();
        assert_eq!(retrieval_key(&upload.file_name), upload.key);
        assert!(upload.url.ends_with("?sig=put"));
        assert!(!upload.file_name.contains('/'));
    }
}
