//! # Keycloak PEP - Policy Enforcement Point
//!
//! A Rust library that separates "authenticated" from "authorized" for
//! services protected by Keycloak:
//!
//! - [`PermissionEvaluator`] asks the realm's token endpoint for a UMA
//!   decision on a named permission, acting as the caller.
//! - [`RoleClaimsEnricher`] turns the `resource_access` token claim into
//!   flat role claims for one audience.
//!
//! ## Features
//!
//! - `middleware` (default): tower layers and Axum extractors

pub mod error;
pub use error::{PepError, Result};

pub mod config;
pub mod identity;
pub mod keycloak;
pub mod auth;

#[cfg(feature = "middleware")]
pub mod axum_integration;

// Re-export commonly used types at crate root
pub use crate::config::{load_config, PepConfig};
pub use crate::identity::{Claim, Identity};
pub use crate::keycloak::{
    AuthorizationOptions, DenyReason, PermissionDecision, PermissionEvaluator, PermissionTransport,
    ReqwestTransport, RoleClaimsEnricher, RoleClaimsOptions,
};
