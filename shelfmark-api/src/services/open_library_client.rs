//! Open Library API client
//!
//! Fetches canonical book metadata by ISBN from the Open Library volumes API
//! and maps it into the consumer's `BookMetadata`. Requests are rate-limited
//! as a courtesy to the public API.

use crate::services::sync_consumer::{BookMetadata, MetadataSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const USER_AGENT: &str = "Shelfmark/0.1.0 (book-review platform)";
const RATE_LIMIT_MS: u64 = 500;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Open Library client errors
///
/// All of these are transient from the consumer's point of view and propagate
/// as retryable.
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("No catalog record for ISBN {0}")]
    IsbnNotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Open Library volumes-brief response: records keyed by internal record id
#[derive(Debug, Deserialize)]
struct VolumeResponse {
    #[serde(default)]
    records: HashMap<String, VolumeRecord>,
}

#[derive(Debug, Deserialize)]
struct VolumeRecord {
    data: VolumeData,
}

#[derive(Debug, Deserialize)]
struct VolumeData {
    title: String,
    #[serde(default)]
    authors: Vec<Named>,
    #[serde(default)]
    publishers: Vec<Named>,
    #[serde(default)]
    subjects: Vec<Named>,
    number_of_pages: Option<i64>,
    cover: Option<Cover>,
    #[serde(default)]
    excerpts: Vec<Excerpt>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Cover {
    medium: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Excerpt {
    text: String,
}

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Open Library API client
pub struct OpenLibraryClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl OpenLibraryClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, MetadataError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    /// Lookup volume metadata by ISBN
    async fn lookup_volume(&self, isbn: &str) -> Result<BookMetadata, MetadataError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/api/volumes/brief/isbn/{}.json", self.base_url, isbn);
        tracing::debug!(isbn = %isbn, url = %url, "Querying Open Library API");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(MetadataError::IsbnNotFound(isbn.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api(status.as_u16(), error_text));
        }

        let volumes: VolumeResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::Parse(e.to_string()))?;

        // The brief endpoint returns an empty object (not 404) for unknown ISBNs
        let record = volumes
            .records
            .into_values()
            .next()
            .ok_or_else(|| MetadataError::IsbnNotFound(isbn.to_string()))?;

        let metadata = map_volume(isbn, record.data);

        tracing::info!(
            isbn = %isbn,
            title = %metadata.title,
            author = %metadata.author.as_deref().unwrap_or("Unknown"),
            "Retrieved book metadata from Open Library"
        );

        Ok(metadata)
    }
}

/// Map an Open Library volume record onto the consumer's metadata shape
fn map_volume(isbn: &str, data: VolumeData) -> BookMetadata {
    BookMetadata {
        isbn: isbn.to_string(),
        title: data.title,
        author: data.authors.into_iter().next().map(|a| a.name),
        description: data.excerpts.into_iter().next().map(|e| e.text),
        genre: data.subjects.into_iter().next().map(|s| s.name),
        pages: data.number_of_pages.unwrap_or(0).max(0),
        publisher: data.publishers.into_iter().next().map(|p| p.name),
        thumbnail_url: data.cover.and_then(|c| c.medium),
    }
}

#[async_trait]
impl MetadataSource for OpenLibraryClient {
    async fn fetch_by_isbn(&self, isbn: &str) -> Result<BookMetadata, MetadataError> {
        self.lookup_volume(isbn).await
    }
}
