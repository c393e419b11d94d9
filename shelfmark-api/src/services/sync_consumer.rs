//! Book synchronization consumer
//!
//! Turns raw "a book was referenced" events into idempotent Book writes.
//! Malformed ISBNs are poison messages and are dropped without any store or
//! catalog interaction; transient catalog failures propagate so the delivery
//! loop can redeliver. The store's uniqueness constraint is the final arbiter
//! for concurrent requests on the same new ISBN.

use crate::db::books::{self, Book, InsertBookError, NewBook};
use crate::services::open_library_client::MetadataError;
use async_trait::async_trait;
use serde::Deserialize;
use shelfmark_common::events::{EventBus, PlatformEvent};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// Redelivery cap for a single synchronization request; past this the event
/// is logged and dropped (stand-in for a dead-letter queue)
pub const MAX_DELIVERY_ATTEMPTS: u32 = 5;

/// A single synchronization request: a raw, not yet validated ISBN
#[derive(Debug, Clone, Deserialize)]
pub struct BookSynchronization {
    pub isbn: String,
}

/// Canonical book metadata returned by a catalog source, keyed to the
/// requested ISBN
#[derive(Debug, Clone)]
pub struct BookMetadata {
    pub isbn: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub pages: i64,
    pub publisher: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl From<BookMetadata> for NewBook {
    fn from(metadata: BookMetadata) -> Self {
        NewBook {
            isbn: metadata.isbn,
            title: metadata.title,
            author: metadata.author,
            description: metadata.description,
            genre: metadata.genre,
            pages: metadata.pages,
            publisher: metadata.publisher,
            thumbnail_url: metadata.thumbnail_url,
        }
    }
}

/// External catalog contract: given an ISBN, canonical metadata or a failure
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_by_isbn(&self, isbn: &str) -> Result<BookMetadata, MetadataError>;
}

/// Book store errors as seen by the consumer
#[derive(Debug, Error)]
pub enum StoreError {
    /// A book with this ISBN already exists (benign race outcome)
    #[error("Book with ISBN {0} already exists")]
    Duplicate(String),

    /// Any other store failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Book store contract: lookup by ISBN and identity-assigning insert,
/// failing distinctly on a uniqueness conflict
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, StoreError>;
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError>;
}

/// SQLite-backed book store
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, StoreError> {
        books::find_by_isbn(&self.pool, isbn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        match books::insert_book(&self.pool, book).await {
            Ok(book) => Ok(book),
            Err(InsertBookError::Duplicate(isbn)) => Err(StoreError::Duplicate(isbn)),
            Err(InsertBookError::Database(e)) => Err(StoreError::Backend(e.to_string())),
        }
    }
}

/// Synchronization failure visible to the delivery mechanism
///
/// Only transient failures surface here; malformed input is resolved locally
/// as a drop.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Catalog fetch failed (retryable)
    #[error("Metadata fetch failed for ISBN {isbn}: {source}")]
    Fetch {
        isbn: String,
        source: MetadataError,
    },

    /// Store failure other than a uniqueness conflict (retryable)
    #[error("Book store failed for ISBN {isbn}: {source}")]
    Store {
        isbn: String,
        source: StoreError,
    },
}

/// What a single consumption did
#[derive(Debug)]
pub enum SyncOutcome {
    /// Malformed ISBN, dropped without side effects
    Skipped,
    /// Book already present (or lost a benign insert race); no write
    AlreadyExists,
    /// New book record written
    Synchronized(Book),
}

/// Synchronization consumer over abstract store and catalog seams
pub struct SyncConsumer {
    store: Arc<dyn BookStore>,
    source: Arc<dyn MetadataSource>,
}

impl SyncConsumer {
    pub fn new(store: Arc<dyn BookStore>, source: Arc<dyn MetadataSource>) -> Self {
        Self { store, source }
    }

    /// Process one synchronization request
    ///
    /// Holds no lock across the catalog call; at most one store write per
    /// distinct ISBN ever, regardless of redelivery count.
    pub async fn consume(
        &self,
        request: &BookSynchronization,
    ) -> Result<SyncOutcome, SyncError> {
        if !is_valid_isbn(&request.isbn) {
            // Permanent failure: drop, never retry, never touch collaborators
            debug!(isbn = %request.isbn, "Dropping synchronization request with malformed ISBN");
            return Ok(SyncOutcome::Skipped);
        }
        let isbn = request.isbn.as_str();

        let existing = self
            .store
            .find_by_isbn(isbn)
            .await
            .map_err(|source| SyncError::Store {
                isbn: isbn.to_string(),
                source,
            })?;
        if existing.is_some() {
            debug!(isbn = %isbn, "Book already synchronized, skipping fetch");
            return Ok(SyncOutcome::AlreadyExists);
        }

        let metadata = self
            .source
            .fetch_by_isbn(isbn)
            .await
            .map_err(|source| SyncError::Fetch {
                isbn: isbn.to_string(),
                source,
            })?;

        match self.store.insert(metadata.into()).await {
            Ok(book) => {
                info!(isbn = %isbn, title = %book.title, "Synchronized new book");
                Ok(SyncOutcome::Synchronized(book))
            }
            // A concurrent consumer won the insert race; the record exists,
            // which is all synchronization promises
            Err(StoreError::Duplicate(_)) => {
                debug!(isbn = %isbn, "Concurrent synchronization already wrote this ISBN");
                Ok(SyncOutcome::AlreadyExists)
            }
            Err(source) => Err(SyncError::Store {
                isbn: isbn.to_string(),
                source,
            }),
        }
    }

    /// Delivery loop: consume `BookReferenced` events from the bus
    ///
    /// Retryable failures are redelivered with a bumped attempt counter and a
    /// linear backoff, up to `MAX_DELIVERY_ATTEMPTS`.
    pub async fn run(self: Arc<Self>, bus: EventBus) {
        let mut rx = bus.subscribe();
        info!("Synchronization consumer started");

        loop {
            match rx.recv().await {
                Ok(PlatformEvent::BookReferenced { isbn, attempt }) => {
                    let request = BookSynchronization { isbn: isbn.clone() };
                    match self.consume(&request).await {
                        Ok(SyncOutcome::Synchronized(book)) => {
                            bus.emit(PlatformEvent::BookSynchronized {
                                book_id: book.id,
                                isbn: book.isbn,
                                timestamp: chrono::Utc::now(),
                            })
                            .ok();
                        }
                        Ok(_) => {}
                        Err(e) if attempt < MAX_DELIVERY_ATTEMPTS => {
                            warn!(
                                isbn = %isbn,
                                attempt = attempt,
                                error = %e,
                                "Synchronization failed, redelivering"
                            );
                            tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt)))
                                .await;
                            bus.emit(PlatformEvent::BookReferenced {
                                isbn,
                                attempt: attempt + 1,
                            })
                            .ok();
                        }
                        Err(e) => {
                            error!(
                                isbn = %isbn,
                                attempts = attempt,
                                error = %e,
                                "Synchronization abandoned after repeated failures"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Synchronization consumer lagged, events dropped");
                }
                Err(RecvError::Closed) => {
                    info!("Event bus closed, synchronization consumer stopping");
                    break;
                }
            }
        }
    }
}

/// Canonical ISBN format: exactly 13 ASCII digits
pub fn is_valid_isbn(isbn: &str) -> bool {
    isbn.len() == 13 && isbn.bytes().all(|b| b.is_ascii_digit())
}
