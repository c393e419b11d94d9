//! shelfmark-api library - book-review platform backend
//!
//! Owns the HTTP surface, the persistence layer, and the service layer: the
//! book synchronization consumer, the review quality verifier, and the review
//! orchestration service.

use axum::Router;
use shelfmark_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

use services::review_service::ReviewService;
use services::review_verifier::ReviewVerifier;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus carrying synchronization traffic
    pub bus: EventBus,
    /// Review orchestration service
    pub reviews: ReviewService,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, bus: EventBus, verifier: Arc<ReviewVerifier>) -> Self {
        let reviews = ReviewService::new(db.clone(), verifier, bus.clone());
        Self { db, bus, reviews }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/api/books", get(api::get_books))
        .route("/api/books/synchronize", post(api::synchronize_book))
        .route("/api/books/reviews", get(api::get_reviews))
        .route("/api/books/reviews/statistics", get(api::get_review_statistics))
        .route("/api/books/:isbn/reviews", post(api::create_review))
        .route("/api/books/:isbn/reviews/:id", delete(api::delete_review))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
