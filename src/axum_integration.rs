//! Axum integration for PEP
//!
//! This module provides utilities for integrating PEP with the Axum web framework:
//! - Bearer token extraction from request headers
//! - `FromRequestParts` extractor for the request's [`Identity`]
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::{routing::get, Router};
//! use keycloak_pep::axum_integration::IdentityExtractor;
//!
//! async fn whoami(identity: IdentityExtractor) -> String {
//!     identity.roles("role").join(",")
//! }
//!
//! let app = Router::new().route("/whoami", get(whoami));
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
};
use std::ops::Deref;

use crate::identity::Identity;

/// Extract the Bearer token from the Authorization header.
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
///
/// ```rust
/// use axum::http::HeaderMap;
/// use keycloak_pep::axum_integration::extract_bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("Authorization", "Bearer my-token".parse().unwrap());
/// assert_eq!(extract_bearer_token(&headers), Some("my-token".to_string()));
/// ```
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Axum extractor for the request's identity
///
/// The identity must be inserted by the `Authenticate` layer (or any other
/// authentication step) before this extractor runs.
#[derive(Debug, Clone)]
pub struct IdentityExtractor(pub Identity);

impl Deref for IdentityExtractor {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Identity> for IdentityExtractor {
    fn from(identity: Identity) -> Self {
        Self(identity)
    }
}

impl IdentityExtractor {
    pub fn into_inner(self) -> Identity {
        self.0
    }
}

impl<S> FromRequestParts<S> for IdentityExtractor
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(IdentityExtractor)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
