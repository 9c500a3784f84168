use crate::config::ObjectStoreConfig;
use crate::search::{SearchError, SearchResult};
use crate::storage::UrlSigner;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::time::Duration;

/// Presigns S3 object URLs
#[derive(Clone)]
pub struct S3UrlSigner {
    client: Client,
    bucket: String,
    expires_in: Duration,
}

impl S3UrlSigner {
    /// Build a signer from the SDK's default credential chain
    pub async fn from_config(config: &ObjectStoreConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let builder = with_overrides(Builder::from(&sdk_config), config);

        Self::new(
            Client::from_conf(builder.build()),
            config.bucket.clone(),
            Duration::from_secs(config.url_expiry_secs),
        )
    }

    pub fn new(client: Client, bucket: String, expires_in: Duration) -> Self {
        Self {
            client,
            bucket,
            expires_in,
        }
    }

    fn presigning(&self) -> SearchResult<PresigningConfig> {
        PresigningConfig::expires_in(self.expires_in)
            .map_err(|e| SearchError::Signing(format!("Invalid URL expiry: {}", e)))
    }
}

/// Apply region and endpoint overrides from configuration
fn with_overrides(mut builder: Builder, config: &ObjectStoreConfig) -> Builder {
    if let Some(region) = &config.region {
        builder = builder.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    builder
}

#[async_trait]
impl UrlSigner for S3UrlSigner {
    async fn presign_get(&self, key: &str) -> SearchResult<String> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| SearchError::Signing(format!("get {}: {}", key, e)))?;
        Ok(request.uri().to_string())
    }

    async fn presign_put(&self, key: &str, content_type: Option<&str>) -> SearchResult<String> {
        let mut put = self.client.put_object().bucket(&self.bucket).key(key);
        if let Some(content_type) = content_type {
            put = put.content_type(content_type);
        }
        let request = put
            .presigned(self.presigning()?)
            .await
            .map_err(|e| SearchError::Signing(format!("put {}: {}", key, e)))?;
        Ok(request.uri().to_string())
    }
}
