use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health and metrics
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Indexing
        .route(
            "/index",
            post(handlers::index_products)
                .delete(handlers::delete_index)
                .fallback(handlers::unsupported),
        )
        .route(
            "/index-custom-document",
            post(handlers::index_custom_documents).fallback(handlers::unsupported),
        )
        .route(
            "/vectorize-index",
            post(handlers::vectorize_index)
                .delete(handlers::delete_vectorize_index)
                .fallback(handlers::unsupported),
        )
        // Object store
        .route(
            "/presigned-url",
            post(handlers::presigned_url).fallback(handlers::unsupported),
        )
        // Search
        .route("/search", post(handlers::search).fallback(handlers::unsupported))
        .fallback(handlers::unsupported)
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
