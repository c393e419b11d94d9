//! Review orchestration service
//!
//! Coordinates creation, listing, statistics, and deletion of reviews,
//! enforcing the quality and authorization policy the transport and
//! persistence layers do not know about. The caller's verified identity is
//! always an explicit parameter.

use crate::db::reviews::{self, NewReview, Review, ReviewOrder, ReviewStatistics};
use crate::db::books;
use crate::services::review_verifier::ReviewVerifier;
use serde::Deserialize;
use shelfmark_common::auth::Identity;
use shelfmark_common::events::{EventBus, PlatformEvent};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Default number of reviews returned when the caller specifies no limit
pub const DEFAULT_LIST_LIMIT: i64 = 20;
/// Hard cap on a single listing
pub const MAX_LIST_LIMIT: i64 = 100;

/// Inclusive rating bounds
const MIN_RATING: i64 = 1;
const MAX_RATING: i64 = 5;

/// Incoming review payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    pub review_title: String,
    pub review_content: String,
    pub rating: i64,
}

/// Review service failures
///
/// Quality rejection and authorization failures are expected outcomes here,
/// not faults; the HTTP layer maps each onto its status code.
#[derive(Debug, Error)]
pub enum ReviewServiceError {
    /// Malformed payload (bad rating, empty fields)
    #[error("Invalid review: {0}")]
    Invalid(String),

    /// Content failed quality classification; carries the violated rule id
    #[error("Review rejected by quality rule: {0}")]
    Rejected(String),

    /// No book exists for the target ISBN
    #[error("No book found for ISBN {0}")]
    UnknownBook(String),

    /// Caller supplied no verified identity
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller lacks the moderator capability
    #[error("Moderator capability required")]
    Forbidden,

    /// No review with this id
    #[error("Review {0} not found")]
    ReviewNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Review orchestration service
#[derive(Clone)]
pub struct ReviewService {
    pool: SqlitePool,
    verifier: Arc<ReviewVerifier>,
    bus: EventBus,
}

impl ReviewService {
    pub fn new(pool: SqlitePool, verifier: Arc<ReviewVerifier>, bus: EventBus) -> Self {
        Self {
            pool,
            verifier,
            bus,
        }
    }

    /// Create a review for the book with the given ISBN
    ///
    /// Order of gates: payload validation, quality classification, book
    /// resolution. Nothing is persisted unless all three pass.
    pub async fn create_review(
        &self,
        isbn: &str,
        payload: ReviewPayload,
        identity: &Identity,
    ) -> Result<Review, ReviewServiceError> {
        validate_payload(&payload)?;

        let verdict = self.verifier.classify(&payload.review_content);
        if let Some(rule) = verdict.violated_rule() {
            info!(isbn = %isbn, rule = %rule, "Review rejected by quality rule");
            return Err(ReviewServiceError::Rejected(rule.to_string()));
        }

        let book = books::find_by_isbn(&self.pool, isbn)
            .await?
            .ok_or_else(|| ReviewServiceError::UnknownBook(isbn.to_string()))?;

        let review = reviews::save_review(
            &self.pool,
            NewReview {
                book_id: book.id,
                reviewer_subject: identity.subject.clone(),
                reviewer_username: identity.username.clone(),
                reviewer_email: identity.email.clone(),
                rating: payload.rating,
                title: payload.review_title,
                content: payload.review_content,
            },
        )
        .await?;

        info!(
            review_id = %review.id,
            isbn = %isbn,
            reviewer = %identity.username,
            "Created review"
        );
        self.bus
            .emit(PlatformEvent::ReviewCreated {
                review_id: review.id,
                book_id: review.book_id,
                timestamp: review.created_at,
            })
            .ok();

        Ok(review)
    }

    /// List reviews up to `limit` in the requested order
    ///
    /// Open to unauthenticated callers. The limit is clamped to
    /// 1..=`MAX_LIST_LIMIT`, defaulting to `DEFAULT_LIST_LIMIT`.
    pub async fn list_reviews(
        &self,
        limit: Option<i64>,
        order: ReviewOrder,
    ) -> Result<Vec<Review>, ReviewServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        Ok(reviews::list_reviews(&self.pool, limit, order).await?)
    }

    /// Compute count and average rating, globally or for one ISBN
    ///
    /// Requires any authenticated identity; the computation itself is pure
    /// aggregation with no side effects.
    pub async fn statistics(
        &self,
        identity: Option<&Identity>,
        isbn: Option<&str>,
    ) -> Result<ReviewStatistics, ReviewServiceError> {
        if identity.is_none() {
            return Err(ReviewServiceError::Unauthenticated);
        }

        Ok(reviews::statistics(&self.pool, isbn).await?)
    }

    /// Delete a review by id
    ///
    /// Unauthenticated callers are rejected before authorization is
    /// evaluated; authorization is evaluated before any store access.
    pub async fn delete_review(
        &self,
        id: Uuid,
        identity: Option<&Identity>,
    ) -> Result<(), ReviewServiceError> {
        let identity = identity.ok_or(ReviewServiceError::Unauthenticated)?;
        if !identity.is_moderator() {
            return Err(ReviewServiceError::Forbidden);
        }

        if !reviews::delete_review(&self.pool, id).await? {
            return Err(ReviewServiceError::ReviewNotFound(id));
        }

        info!(review_id = %id, moderator = %identity.username, "Deleted review");
        self.bus
            .emit(PlatformEvent::ReviewDeleted {
                review_id: id,
                timestamp: chrono::Utc::now(),
            })
            .ok();

        Ok(())
    }
}

/// Structural payload validation, before any classification
fn validate_payload(payload: &ReviewPayload) -> Result<(), ReviewServiceError> {
    if payload.review_title.trim().is_empty() {
        return Err(ReviewServiceError::Invalid(
            "review title must not be empty".to_string(),
        ));
    }
    if payload.review_content.trim().is_empty() {
        return Err(ReviewServiceError::Invalid(
            "review content must not be empty".to_string(),
        ));
    }
    if !(MIN_RATING..=MAX_RATING).contains(&payload.rating) {
        return Err(ReviewServiceError::Invalid(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(())
}
