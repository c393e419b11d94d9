//! Review endpoints

use crate::api::identity::{MaybeIdentity, RequireIdentity};
use crate::db::reviews::{Review, ReviewOrder, ReviewStatistics};
use crate::error::ApiResult;
use crate::services::review_service::ReviewPayload;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Query parameters for review listing
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub order: Option<String>,
}

/// Query parameters for statistics
#[derive(Debug, Deserialize)]
pub struct StatisticsParams {
    pub isbn: Option<String>,
}

/// POST /api/books/:isbn/reviews - create a review (authenticated)
///
/// 201 with a Location header on success; 400 with the violated rule code
/// when quality classification fails.
pub async fn create_review(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    RequireIdentity(identity): RequireIdentity,
    Json(payload): Json<ReviewPayload>,
) -> ApiResult<(StatusCode, HeaderMap, Json<serde_json::Value>)> {
    let review = state.reviews.create_review(&isbn, payload, &identity).await?;

    let location = format!("/api/books/{}/reviews/{}", isbn, review.id);
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(json!({ "id": review.id })),
    ))
}

/// GET /api/books/reviews - list reviews (public)
pub async fn get_reviews(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Review>>> {
    let order = params
        .order
        .as_deref()
        .map(ReviewOrder::parse)
        .unwrap_or_default();

    let reviews = state.reviews.list_reviews(params.limit, order).await?;
    Ok(Json(reviews))
}

/// GET /api/books/reviews/statistics - count and average rating (authenticated)
pub async fn get_review_statistics(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Query(params): Query<StatisticsParams>,
) -> ApiResult<Json<ReviewStatistics>> {
    let stats = state
        .reviews
        .statistics(identity.as_ref(), params.isbn.as_deref())
        .await?;
    Ok(Json(stats))
}

/// DELETE /api/books/:isbn/reviews/:id - remove a review (moderator only)
pub async fn delete_review(
    State(state): State<AppState>,
    Path((_isbn, review_id)): Path<(String, Uuid)>,
    MaybeIdentity(identity): MaybeIdentity,
) -> ApiResult<StatusCode> {
    state
        .reviews
        .delete_review(review_id, identity.as_ref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
