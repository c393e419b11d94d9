//! Identity extraction from forwarded gateway headers
//!
//! The gateway terminates the bearer token and forwards verified claims as
//! `x-auth-*` headers; these extractors turn them into an `Identity` value
//! that handlers thread explicitly into the service layer.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use shelfmark_common::auth::{
    Identity, CAPABILITIES_HEADER, EMAIL_HEADER, SUBJECT_HEADER, USERNAME_HEADER,
};
use std::convert::Infallible;

fn identity_from_parts(parts: &Parts) -> Option<Identity> {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    };

    Identity::from_forwarded(
        header(SUBJECT_HEADER),
        header(USERNAME_HEADER),
        header(EMAIL_HEADER),
        header(CAPABILITIES_HEADER),
    )
}

/// Optional identity: `None` for unauthenticated requests
///
/// Used where the service layer itself decides whether authentication is
/// required, keeping the policy in one place.
pub struct MaybeIdentity(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(identity_from_parts(parts)))
    }
}

/// Required identity: rejects unauthenticated requests with 401
pub struct RequireIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)
            .map(RequireIdentity)
            .ok_or(ApiError::Unauthorized)
    }
}
