//! Operation resolution and dispatch

use crate::api::Envelope;
use crate::context::AppContext;
use crate::error::{AppError, Result};
use crate::indexing::load_catalog;
use crate::metrics::OPERATIONS_TOTAL;
use crate::storage::presign_upload;
use axum::http::Method;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

/// Every operation the service exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Operation {
    Index,
    IndexCustomDocument,
    DeleteIndex,
    PresignedUrl,
    VectorizeIndex,
    DeleteVectorizeIndex,
    Search,
}

impl Operation {
    /// Resolve the operation for an HTTP method and resource path
    pub fn resolve(method: &Method, path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        match (method.as_str(), path) {
            ("POST", "/index") => Some(Self::Index),
            ("POST", "/index-custom-document") => Some(Self::IndexCustomDocument),
            ("DELETE", "/index") => Some(Self::DeleteIndex),
            ("POST", "/presigned-url") => Some(Self::PresignedUrl),
            ("POST", "/vectorize-index") => Some(Self::VectorizeIndex),
            ("DELETE", "/vectorize-index") => Some(Self::DeleteVectorizeIndex),
            ("POST", "/search") => Some(Self::Search),
            _ => None,
        }
    }

    /// Method and resource path serving this operation
    pub fn route(&self) -> (Method, &'static str) {
        match self {
            Self::Index => (Method::POST, "/index"),
            Self::IndexCustomDocument => (Method::POST, "/index-custom-document"),
            Self::DeleteIndex => (Method::DELETE, "/index"),
            Self::PresignedUrl => (Method::POST, "/presigned-url"),
            Self::VectorizeIndex => (Method::POST, "/vectorize-index"),
            Self::DeleteVectorizeIndex => (Method::DELETE, "/vectorize-index"),
            Self::Search => (Method::POST, "/search"),
        }
    }
}

/// Body of the presigned-url operation
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    #[validate(length(min = 1, max = 255), custom(function = "validate_filename"))]
    pub filename: String,
    pub content_type: Option<String>,
}

fn validate_filename(filename: &str) -> std::result::Result<(), ValidationError> {
    if filename.contains('/') {
        return Err(ValidationError::new("filename_contains_separator"));
    }
    Ok(())
}

/// Run `operation` with the parsed request body
pub async fn dispatch(ctx: &AppContext, operation: Operation, body: Value) -> Result<Envelope> {
    let start = Instant::now();
    info!(operation = %operation, "Dispatching operation");

    let deadline = Duration::from_secs(ctx.config.server.request_timeout_secs);
    let outcome = match tokio::time::timeout(deadline, execute(ctx, operation, body)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(AppError::Timeout(format!(
            "Operation {} exceeded {}s",
            operation,
            deadline.as_secs()
        ))),
    };

    let label: &'static str = operation.into();
    match &outcome {
        Ok(_) => {
            OPERATIONS_TOTAL.with_label_values(&[label, "success"]).inc();
            info!(
                operation = %operation,
                duration_ms = start.elapsed().as_millis() as u64,
                "Operation completed"
            );
        }
        Err(e) => {
            OPERATIONS_TOTAL.with_label_values(&[label, "failure"]).inc();
            warn!(operation = %operation, error_code = e.error_code(), "Operation failed");
        }
    }
    outcome
}

async fn execute(ctx: &AppContext, operation: Operation, body: Value) -> Result<Envelope> {
    match operation {
        Operation::Index => {
            let products = load_catalog(&ctx.config.indexing.catalog_path).await?;
            ctx.bulk.index_all(products).await?;
            Ok(Envelope::success("Products indexed successfully"))
        }
        Operation::IndexCustomDocument => {
            let documents = match body {
                Value::Array(documents) => documents,
                _ => {
                    return Err(AppError::Validation(
                        "Invalid request, body should be a list of documents".into(),
                    ))
                }
            };
            if documents.is_empty() {
                return Err(AppError::Processing("No products to index".into()));
            }
            ctx.bulk.index_all(documents).await?;
            Ok(Envelope::success("Products indexed successfully"))
        }
        Operation::DeleteIndex => {
            ctx.engine.delete_index(ctx.bulk.index()).await?;
            Ok(Envelope::success("Index deleted successfully"))
        }
        Operation::PresignedUrl => {
            let request: PresignRequest = serde_json::from_value(body).map_err(|_| {
                AppError::Validation("Invalid request, filename should be of type string".into())
            })?;
            request.validate()?;
            let upload =
                presign_upload(ctx.signer.as_ref(), &request.filename, request.content_type.as_deref())
                    .await?;
            Ok(Envelope::success(serde_json::to_value(upload)?))
        }
        Operation::VectorizeIndex => {
            let products = load_catalog(&ctx.config.indexing.catalog_path).await?;
            ctx.vector.index_all(products).await?;
            Ok(Envelope::success("Products indexed successfully"))
        }
        Operation::DeleteVectorizeIndex => {
            ctx.vector.delete_all().await?;
            Ok(Envelope::success("Index deleted successfully"))
        }
        Operation::Search => {
            let response = ctx.search.search(&body).await?;
            Ok(Envelope::success(response))
        }
    }
}
