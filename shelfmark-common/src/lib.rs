//! Shared types for the Shelfmark book-review platform
//!
//! Holds the pieces both the service crate and its tests need: the common
//! error type, the authenticated-identity model, and the in-process event bus
//! that carries book synchronization traffic.

pub mod auth;
pub mod error;
pub mod events;

pub use error::{Error, Result};
