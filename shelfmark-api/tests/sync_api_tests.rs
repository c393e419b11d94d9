//! End-to-end synchronization tests
//!
//! Drives POST /api/books/synchronize through the real router and event bus
//! into a running consumer, with the catalog replaced by a mock source.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use shelfmark_api::db::books::find_by_isbn;
use shelfmark_api::services::open_library_client::MetadataError;
use shelfmark_api::services::sync_consumer::{
    BookMetadata, MetadataSource, SqliteBookStore, SyncConsumer,
};
use shelfmark_api::services::ReviewVerifier;
use shelfmark_api::{build_router, db, AppState};
use shelfmark_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

const VALID_ISBN: &str = "1234567891234";

/// Catalog mock serving a single fixed record and counting fetches
struct FixedSource {
    fetches: AtomicUsize,
}

#[async_trait]
impl MetadataSource for FixedSource {
    async fn fetch_by_isbn(&self, isbn: &str) -> Result<BookMetadata, MetadataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if isbn == VALID_ISBN {
            Ok(BookMetadata {
                isbn: isbn.to_string(),
                title: "Java book".to_string(),
                author: Some("Duke".to_string()),
                description: None,
                genre: Some("Programming".to_string()),
                pages: 200,
                publisher: None,
                thumbnail_url: None,
            })
        } else {
            Err(MetadataError::IsbnNotFound(isbn.to_string()))
        }
    }
}

struct TestHarness {
    app: axum::Router,
    pool: SqlitePool,
    source: Arc<FixedSource>,
}

/// Test helper: full app with a live consumer wired to a mock catalog
async fn setup() -> TestHarness {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Should create in-memory database");
    db::create_schema(&pool).await.expect("Should create schema");

    let bus = EventBus::new(16);
    let source = Arc::new(FixedSource {
        fetches: AtomicUsize::new(0),
    });

    let consumer = Arc::new(SyncConsumer::new(
        Arc::new(SqliteBookStore::new(pool.clone())),
        Arc::clone(&source) as Arc<dyn MetadataSource>,
    ));
    tokio::spawn(consumer.run(bus.clone()));
    // Let the consumer subscribe before any event is published
    tokio::task::yield_now().await;

    let state = AppState::new(pool.clone(), bus, Arc::new(ReviewVerifier::new()));
    TestHarness {
        app: build_router(state),
        pool,
        source,
    }
}

async fn post_synchronize(app: &axum::Router, isbn: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/books/synchronize")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "isbn": isbn }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

/// Poll until the book shows up, or give up after ~2s
async fn wait_for_book(pool: &SqlitePool, isbn: &str) -> bool {
    for _ in 0..200 {
        if find_by_isbn(pool, isbn).await.unwrap().is_some() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_synchronize_writes_book_through_the_bus() {
    let harness = setup().await;

    let status = post_synchronize(&harness.app, VALID_ISBN).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    assert!(
        wait_for_book(&harness.pool, VALID_ISBN).await,
        "book should be synchronized"
    );
    let book = find_by_isbn(&harness.pool, VALID_ISBN)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(book.title, "Java book");
    assert_eq!(harness.source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_synchronize_is_idempotent_across_requests() {
    let harness = setup().await;

    for _ in 0..3 {
        let status = post_synchronize(&harness.app, VALID_ISBN).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    assert!(wait_for_book(&harness.pool, VALID_ISBN).await);
    // Give trailing deliveries time to be consumed
    tokio::time::sleep(Duration::from_millis(100)).await;

    let books = shelfmark_api::db::books::list_books(&harness.pool).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(harness.source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_synchronize_drops_malformed_isbn_silently() {
    let harness = setup().await;

    // Accepted at the HTTP boundary; the consumer drops it without any
    // catalog interaction
    let status = post_synchronize(&harness.app, "42").await;
    assert_eq!(status, StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let books = shelfmark_api::db::books::list_books(&harness.pool).await.unwrap();
    assert!(books.is_empty());
    assert_eq!(harness.source.fetches.load(Ordering::SeqCst), 0);
}
