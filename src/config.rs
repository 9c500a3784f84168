use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Search engine configuration
    pub engine: EngineConfig,

    /// Object store configuration
    pub object_store: ObjectStoreConfig,

    /// Embedding service configuration
    pub embedding: EmbeddingConfig,

    /// Indexing configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CATALOG_SEARCH_)
            .add_source(
                config::Environment::with_prefix("CATALOG_SEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
            object_store: ObjectStoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            indexing: IndexingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Hard deadline for a single request (seconds); bulk indexing runs under it
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the search engine REST API
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,

    /// Keyword index
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Vector index stored with on-disk mode
    #[serde(default = "default_on_disk_index")]
    pub on_disk_index: String,

    /// Vector index held fully in memory
    #[serde(default = "default_in_memory_index")]
    pub in_memory_index: String,

    /// Search pipeline used by hybrid queries
    #[serde(default = "default_search_pipeline")]
    pub search_pipeline: String,

    /// Basic auth username (from env var)
    pub username_env: Option<String>,

    /// Basic auth password (from env var)
    pub password_env: Option<String>,

    /// Engine request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_engine_endpoint(),
            index_name: default_index_name(),
            on_disk_index: default_on_disk_index(),
            in_memory_index: default_in_memory_index(),
            search_pipeline: default_search_pipeline(),
            username_env: None,
            password_env: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Bucket holding product images
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Region override (falls back to the SDK's default chain)
    pub region: Option<String>,

    /// Endpoint override (e.g. MinIO or LocalStack)
    pub endpoint: Option<String>,

    /// Lifetime of issued URLs (seconds)
    #[serde(default = "default_url_expiry")]
    pub url_expiry_secs: u64,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: None,
            endpoint: None,
            url_expiry_secs: default_url_expiry(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding service endpoint
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Model identifier used to embed documents and queries
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Maximum embedding calls in flight within one bulk batch
    #[serde(default = "default_embedding_concurrency")]
    pub max_concurrent: usize,

    /// Embedding request timeout (seconds)
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            model_id: default_model_id(),
            dimension: default_dimension(),
            max_concurrent: default_embedding_concurrency(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Product catalog loaded by the `index` operation (JSON array)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Documents per bulk request
    #[serde(default = "default_batch_documents")]
    pub batch_documents: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            batch_documents: default_batch_documents(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    300
}

fn default_engine_endpoint() -> String {
    "http://localhost:9200".to_string()
}

fn default_index_name() -> String {
    "products".to_string()
}

fn default_on_disk_index() -> String {
    "products-vector-on-disk".to_string()
}

fn default_in_memory_index() -> String {
    "products-vector-in-memory".to_string()
}

fn default_search_pipeline() -> String {
    "oss_srch_pipeline".to_string()
}

fn default_bucket() -> String {
    "product-images".to_string()
}

fn default_url_expiry() -> u64 {
    3600
}

fn default_embedding_endpoint() -> String {
    "http://localhost:8081/embed".to_string()
}

fn default_model_id() -> String {
    "cohere.embed-english-v3".to_string()
}

fn default_dimension() -> usize {
    1024
}

fn default_embedding_concurrency() -> usize {
    1
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/products_content.json")
}

fn default_batch_documents() -> usize {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "catalog-search".to_string()
}

fn default_true() -> bool {
    true
}
