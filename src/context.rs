//! Process-wide collaborators, built once at startup

use crate::config::Config;
use crate::embedding::{Embedder, HttpEmbedder};
use crate::engine::{OpenSearchClient, SearchEngine};
use crate::enrichment::{ImageUrlEnricher, ResultEnricher};
use crate::error::Result;
use crate::indexing::{BulkIndexer, VectorIndexer};
use crate::search::{IndexNames, QueryBuilder, SearchService};
use crate::storage::{S3UrlSigner, UrlSigner};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Clients and services shared by every operation
pub struct AppContext {
    pub config: Arc<Config>,
    pub engine: Arc<dyn SearchEngine>,
    pub signer: Arc<dyn UrlSigner>,
    pub search: SearchService,
    pub bulk: BulkIndexer,
    pub vector: VectorIndexer,
    pub started_at: DateTime<Utc>,
    uptime: Instant,
}

impl AppContext {
    /// Build production clients from configuration
    pub async fn from_config(config: Config) -> Result<Self> {
        let engine: Arc<dyn SearchEngine> = Arc::new(OpenSearchClient::new(&config.engine)?);
        info!(endpoint = %config.engine.endpoint, "Engine client initialized");

        let signer: Arc<dyn UrlSigner> = Arc::new(S3UrlSigner::from_config(&config.object_store).await);
        info!(bucket = %config.object_store.bucket, "Object store signer initialized");

        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(&config.embedding)?);
        info!(model = %config.embedding.model_id, "Embedding client initialized");

        Ok(Self::new(config, engine, signer, embedder))
    }

    /// Assemble services around the given clients
    pub fn new(
        config: Config,
        engine: Arc<dyn SearchEngine>,
        signer: Arc<dyn UrlSigner>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let enricher = ResultEnricher::new().with_enricher(Arc::new(ImageUrlEnricher::new(signer.clone())));

        let search = SearchService::new(
            engine.clone(),
            embedder.clone(),
            enricher,
            QueryBuilder::new(config.engine.search_pipeline.clone()),
            IndexNames::from(&config.engine),
        );

        let bulk = BulkIndexer::new(engine.clone(), config.engine.index_name.clone())
            .with_batch_documents(config.indexing.batch_documents);

        let vector = VectorIndexer::new(
            engine.clone(),
            embedder,
            config.engine.on_disk_index.clone(),
            config.engine.in_memory_index.clone(),
        )
        .with_pipeline(config.engine.search_pipeline.clone())
        .with_dimension(config.embedding.dimension)
        .with_max_concurrent(config.embedding.max_concurrent)
        .with_batch_documents(config.indexing.batch_documents);

        Self {
            config: Arc::new(config),
            engine,
            signer,
            search,
            bulk,
            vector,
            started_at: Utc::now(),
            uptime: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.uptime.elapsed().as_secs()
    }
}
