//! Book endpoints
//!
//! Listing of synchronized books and the ingest edge of the synchronization
//! pipeline: `POST /api/books/synchronize` publishes a `BookReferenced` event
//! and returns immediately; the consumer does the actual work.

use crate::db::books::{self, Book};
use crate::error::{ApiError, ApiResult};
use crate::services::sync_consumer::BookSynchronization;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use shelfmark_common::events::PlatformEvent;
use tracing::warn;

/// GET /api/books - all synchronized books
///
/// Internal record ids are not exposed; ISBN is the public identifier.
pub async fn get_books(State(state): State<AppState>) -> ApiResult<Json<Vec<Book>>> {
    let books = books::list_books(&state.db)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(books))
}

/// POST /api/books/synchronize - request metadata synchronization for an ISBN
///
/// Fire-and-forget: the request is published to the event bus and the caller
/// gets 202 regardless of the eventual outcome. Validation, deduplication,
/// and retries are the consumer's concern.
pub async fn synchronize_book(
    State(state): State<AppState>,
    Json(request): Json<BookSynchronization>,
) -> StatusCode {
    if state
        .bus
        .emit(PlatformEvent::book_referenced(request.isbn.clone()))
        .is_err()
    {
        // No consumer attached; the event is lost. The delivery mechanism's
        // durability is out of scope here, but the gap must be visible.
        warn!(isbn = %request.isbn, "No synchronization consumer subscribed, event dropped");
    }

    StatusCode::ACCEPTED
}
