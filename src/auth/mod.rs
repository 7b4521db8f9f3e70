//! Authorization helpers and middleware
//!
//! This module provides role checks over an [`Identity`](crate::Identity) and,
//! with the `middleware` feature, tower layers that wire the PEP into an Axum
//! request pipeline.
//!
//! # Features
//!
//! - `Identity` extension methods for checking role claims
//! - `Authenticate` layer turning a validated bearer token into an identity
//! - `EnrichRoles` layer deriving role claims from `resource_access`
//! - `RequirePermission` layer gating routes on a Keycloak UMA decision
//! - `RequireRole` layer for RBAC on derived roles
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use keycloak_pep::auth::{Authenticate, EnrichRoles, RequirePermission};
//! use tower::ServiceBuilder;
//!
//! let app = Router::new()
//!     .route("/queues", get(list_queues))
//!     .layer(ServiceBuilder::new()
//!         .layer(Authenticate::new(validator))
//!         .layer(EnrichRoles::new(enricher))
//!         .layer(RequirePermission::new(evaluator, "queue:read"))
//!     );
//! ```

pub mod claims;

#[cfg(feature = "middleware")]
pub mod authenticate;
#[cfg(feature = "middleware")]
pub mod error;
#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "middleware")]
pub use authenticate::{Authenticate, TokenValidator};
#[cfg(feature = "middleware")]
pub use error::AuthorizationError;
#[cfg(feature = "middleware")]
pub use middleware::{EnrichRoles, RequirePermission, RequireRole};
