//! Keycloak authorization services
//!
//! This module provides UMA decision checks against a realm's token endpoint
//! and role-claim derivation from the `resource_access` token claim.

pub mod types;
pub mod transport;
pub mod authorization;
pub mod roles;

pub use types::*;
pub use transport::*;
pub use authorization::*;
pub use roles::*;
