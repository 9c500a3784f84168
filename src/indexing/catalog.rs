use crate::search::{SearchError, SearchResult};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error};

/// Read the product catalog, a JSON array of documents
pub async fn load_catalog(path: &Path) -> SearchResult<Vec<Value>> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        SearchError::Catalog(format!("Failed to read catalog {}: {}", path.display(), e))
    })?;

    let products: Vec<Value> = serde_json::from_str(&raw).map_err(|e| {
        SearchError::Catalog(format!("Failed to parse catalog {}: {}", path.display(), e))
    })?;

    if products.is_empty() {
        let msg = "No products to index";
        error!(path = %path.display(), "{}", msg);
        return Err(SearchError::Catalog(msg.to_string()));
    }

    debug!(path = %path.display(), products = products.len(), "Catalog loaded");
    Ok(products)
}
