//! HTTP API handlers
//!
//! Thin transport layer: extract, delegate to the service layer, map results
//! onto status codes. No policy lives here.

pub mod books;
pub mod health;
pub mod identity;
pub mod reviews;

pub use books::{get_books, synchronize_book};
pub use health::health_routes;
pub use identity::{MaybeIdentity, RequireIdentity};
pub use reviews::{create_review, delete_review, get_review_statistics, get_reviews};
