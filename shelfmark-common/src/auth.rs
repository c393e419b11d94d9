//! Authenticated identity model
//!
//! Token verification happens upstream (the API gateway terminates the bearer
//! token and forwards the verified claims as `x-auth-*` headers). This module
//! only models the resulting identity and parses the forwarded header values.
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions and plain types. No HTTP framework
//! dependencies (Axum, etc.) - the header extractor lives in the service crate.

use serde::{Deserialize, Serialize};

/// Header carrying the stable subject id of the verified caller
pub const SUBJECT_HEADER: &str = "x-auth-subject";
/// Header carrying the caller's preferred username
pub const USERNAME_HEADER: &str = "x-auth-username";
/// Header carrying the caller's email address
pub const EMAIL_HEADER: &str = "x-auth-email";
/// Header carrying the comma-separated capability grants
pub const CAPABILITIES_HEADER: &str = "x-auth-capabilities";

/// Capability granted to an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Permits review deletion, distinct from ordinary authenticated access
    Moderator,
}

impl Capability {
    /// Parse a single capability token; unknown grants are ignored by callers
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "moderator" => Some(Capability::Moderator),
            _ => None,
        }
    }
}

/// Verified identity of an authenticated caller
///
/// Always threaded explicitly into service calls as a parameter - never read
/// from ambient or task-local context - so the core stays testable without a
/// live authentication stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject id assigned by the identity provider
    pub subject: String,
    /// Display name (preferred username claim)
    pub username: String,
    /// Contact address (email claim)
    pub email: String,
    /// Capability grants held by this caller
    pub capabilities: Vec<Capability>,
}

impl Identity {
    /// Whether this identity carries the moderator capability
    pub fn is_moderator(&self) -> bool {
        self.capabilities.contains(&Capability::Moderator)
    }

    /// Build an identity from forwarded gateway header values
    ///
    /// Returns `None` when no subject was forwarded (unauthenticated request).
    /// Unknown capability tokens are dropped rather than rejected - the
    /// gateway may grant roles this service does not know about.
    pub fn from_forwarded(
        subject: Option<&str>,
        username: Option<&str>,
        email: Option<&str>,
        capabilities: Option<&str>,
    ) -> Option<Self> {
        let subject = subject?.trim();
        if subject.is_empty() {
            return None;
        }

        let capabilities = capabilities
            .map(|raw| raw.split(',').filter_map(Capability::parse).collect())
            .unwrap_or_default();

        Some(Identity {
            subject: subject.to_string(),
            username: username.unwrap_or_default().trim().to_string(),
            email: email.unwrap_or_default().trim().to_string(),
            capabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_full_headers() {
        let identity = Identity::from_forwarded(
            Some("user-123"),
            Some("duke"),
            Some("duke@example.com"),
            Some("moderator"),
        )
        .expect("subject present");

        assert_eq!(identity.subject, "user-123");
        assert_eq!(identity.username, "duke");
        assert_eq!(identity.email, "duke@example.com");
        assert!(identity.is_moderator());
    }

    #[test]
    fn test_missing_subject_is_unauthenticated() {
        assert!(Identity::from_forwarded(None, Some("duke"), None, None).is_none());
        assert!(Identity::from_forwarded(Some("   "), None, None, None).is_none());
    }

    #[test]
    fn test_unknown_capabilities_are_dropped() {
        let identity = Identity::from_forwarded(
            Some("user-123"),
            None,
            None,
            Some("admin, moderator, billing"),
        )
        .expect("subject present");

        assert_eq!(identity.capabilities, vec![Capability::Moderator]);
    }

    #[test]
    fn test_plain_user_is_not_moderator() {
        let identity = Identity::from_forwarded(Some("user-123"), Some("duke"), None, None)
            .expect("subject present");

        assert!(identity.capabilities.is_empty());
        assert!(!identity.is_moderator());
    }

    #[test]
    fn test_capability_parse_is_case_insensitive() {
        assert_eq!(Capability::parse(" Moderator "), Some(Capability::Moderator));
        assert_eq!(Capability::parse("MODERATOR"), Some(Capability::Moderator));
        assert_eq!(Capability::parse("reader"), None);
    }
}
