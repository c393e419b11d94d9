//! Service layer
//!
//! Core platform logic: the catalog client, the synchronization consumer, the
//! review quality verifier, and the review orchestration service.

pub mod open_library_client;
pub mod review_service;
pub mod review_verifier;
pub mod sync_consumer;

pub use open_library_client::OpenLibraryClient;
pub use review_service::ReviewService;
pub use review_verifier::ReviewVerifier;
pub use sync_consumer::SyncConsumer;
