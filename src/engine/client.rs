use crate::config::EngineConfig;
use crate::engine::{BulkResponse, SearchEngine};
use crate::metrics::ENGINE_REQUEST_DURATION_SECONDS;
use crate::search::{SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// REST client for an OpenSearch-compatible engine
#[derive(Clone)]
pub struct OpenSearchClient {
    client: Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl OpenSearchClient {
    /// Create a client from engine configuration
    pub fn new(config: &EngineConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let username = config.username_env.as_deref().and_then(|var| std::env::var(var).ok());
        let password = config.password_env.as_deref().and_then(|var| std::env::var(var).ok());
        let credentials = match (username, password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        };

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Create a client without authentication
    pub fn with_endpoint(endpoint: impl Into<String>) -> SearchResult<Self> {
        let config = EngineConfig {
            endpoint: endpoint.into(),
            ..Default::default()
        };
        Self::new(&config)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    /// Send a request, returning status and parsed JSON body
    async fn execute(&self, call: &str, request: RequestBuilder) -> SearchResult<(StatusCode, Value)> {
        let start = Instant::now();
        let response = self.authorize(request).send().await;
        ENGINE_REQUEST_DURATION_SECONDS
            .with_label_values(&[call])
            .observe(start.elapsed().as_secs_f64());

        let response = response.map_err(|e| {
            if e.is_timeout() {
                SearchError::Transport(format!("{} timed out: {}", call, e))
            } else {
                SearchError::Transport(format!("{} failed: {}", call, e))
            }
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(call, status = status.as_u16(), "Engine responded");
        Ok((status, body))
    }

    async fn expect_success(&self, call: &str, request: RequestBuilder) -> SearchResult<Value> {
        let (status, body) = self.execute(call, request).await?;
        if !status.is_success() {
            return Err(SearchError::EngineRejected {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }
        Ok(body)
    }
}

/// Serialize entries as newline-delimited JSON, trailing newline included
pub(crate) fn to_ndjson(entries: &[Value]) -> SearchResult<String> {
    let mut payload = String::new();
    for entry in entries {
        payload.push_str(&serde_json::to_string(entry)?);
        payload.push('\n');
    }
    Ok(payload)
}

fn error_reason(body: &Value) -> String {
    body.pointer("/error/reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl SearchEngine for OpenSearchClient {
    async fn search(&self, index: &str, body: &Value, pipeline: Option<&str>) -> SearchResult<Value> {
        let mut request = self.client.post(self.url(&format!("{}/_search", index))).json(body);
        if let Some(pipeline) = pipeline {
            request = request.query(&[("search_pipeline", pipeline)]);
        }
        self.expect_success("search", request).await
    }

    async fn bulk(&self, entries: &[Value]) -> SearchResult<BulkResponse> {
        let payload = to_ndjson(entries)?;
        let request = self
            .client
            .post(self.url("_bulk"))
            .header("Content-Type", "application/x-ndjson")
            .body(payload);
        let body = self.expect_success("bulk", request).await?;
        Ok(BulkResponse::new(body))
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        let (status, body) = self.execute("index_exists", self.client.head(self.url(index))).await?;
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(SearchError::EngineRejected {
                status: s.as_u16(),
                body: body.to_string(),
            }),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()> {
        self.expect_success("create_index", self.client.put(self.url(index)).json(body))
            .await?;
        info!(index, "Index created");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> SearchResult<Value> {
        let (status, body) = self
            .execute("delete_index", self.client.delete(self.url(index)))
            .await?;
        if !status.is_success() {
            return Err(SearchError::DeletionFailed(error_reason(&body)));
        }
        info!(index, response = %body, "Index deleted");
        Ok(body)
    }

    async fn put_search_pipeline(&self, name: &str, body: &Value) -> SearchResult<()> {
        let request = self
            .client
            .put(self.url(&format!("_search/pipeline/{}", name)))
            .json(body);
        self.expect_success("put_search_pipeline", request).await?;
        info!(pipeline = name, "Search pipeline stored");
        Ok(())
    }
}
