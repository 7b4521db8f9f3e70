//! Configuration parsing module for PEP
//!
//! This module loads authorization and role-claim settings from TOML files.
//! The `[openid_connect]` section mirrors the usual Keycloak client settings
//! and fills in whatever `[authorization]` and `[roles]` leave out.
//!
//! # Example
//!
//! ```rust,ignore
//! use keycloak_pep::config::load_config;
//!
//! let config = load_config("config.toml")?;
//! let evaluator = PermissionEvaluator::new(config.authorization_options()?)?;
//! let enricher = RoleClaimsEnricher::new(config.role_claims_options()?)?;
//! ```

use crate::keycloak::types::{
    AuthorizationOptions, RoleClaimsOptions, DEFAULT_AUTHENTICATION_SCHEME, DEFAULT_PERMISSION_TIMEOUT,
    DEFAULT_ROLE_CLAIM_TYPE,
};
use crate::{PepError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PepConfig {
    /// Permission evaluation section
    #[serde(default)]
    pub authorization: Option<AuthorizationConfig>,

    /// Role claims section
    #[serde(default)]
    pub roles: Option<RolesConfig>,

    /// OpenID Connect client section
    #[serde(default)]
    pub openid_connect: Option<OpenIdConnectConfig>,
}

impl PepConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_config(path)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PepError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Build validated options for `PermissionEvaluator`
    pub fn authorization_options(&self) -> Result<AuthorizationOptions> {
        let section = self.authorization.clone().unwrap_or_default();
        let oidc = self.openid_connect.as_ref();

        let token_endpoint = section
            .token_endpoint
            .or_else(|| oidc.and_then(|o| o.token_url.clone()))
            .ok_or_else(|| PepError::Config("authorization.token_endpoint is required".to_string()))?;

        let audience = section
            .audience
            .or_else(|| oidc.and_then(|o| o.client_id.clone()))
            .ok_or_else(|| PepError::Config("authorization.audience is required".to_string()))?;

        let options = AuthorizationOptions {
            required_scheme: section
                .required_scheme
                .unwrap_or_else(|| DEFAULT_AUTHENTICATION_SCHEME.to_string()),
            token_endpoint,
            audience,
            timeout: section
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PERMISSION_TIMEOUT),
        };
        options.validate()?;
        Ok(options)
    }

    /// Build validated options for `RoleClaimsEnricher`
    pub fn role_claims_options(&self) -> Result<RoleClaimsOptions> {
        let section = self.roles.clone().unwrap_or_default();

        let audience = section
            .audience
            .or_else(|| self.authorization.as_ref().and_then(|a| a.audience.clone()))
            .or_else(|| self.openid_connect.as_ref().and_then(|o| o.client_id.clone()))
            .ok_or_else(|| PepError::Config("roles.audience is required".to_string()))?;

        let options = RoleClaimsOptions {
            audience,
            role_claim_type: section
                .role_claim_type
                .unwrap_or_else(|| DEFAULT_ROLE_CLAIM_TYPE.to_string()),
        };
        options.validate()?;
        Ok(options)
    }
}

/// Permission evaluation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// Token endpoint receiving UMA decision requests
    #[serde(default)]
    pub token_endpoint: Option<String>,

    /// Resource server client ID the permissions belong to
    #[serde(default)]
    pub audience: Option<String>,

    /// Authentication scheme that holds the caller's token (default: "Bearer")
    #[serde(default)]
    pub required_scheme: Option<String>,

    /// Permission check timeout in seconds (default: 5)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Role claim settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    /// Key under `resource_access` to read roles from
    #[serde(default)]
    pub audience: Option<String>,

    /// Claim type for derived roles (default: "role")
    #[serde(default)]
    pub role_claim_type: Option<String>,
}

/// OpenID Connect client settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenIdConnectConfig {
    /// Realm issuer URL
    #[serde(default)]
    pub authority: Option<String>,

    /// Realm token endpoint
    #[serde(default)]
    pub token_url: Option<String>,

    /// Client ID of this API
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Load configuration from a TOML file
///
/// # Example
///
/// ```rust,ignore
/// let config = keycloak_pep::config::load_config("config.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PepConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| PepError::Config(format!("Failed to read config file: {}", e)))?;

    PepConfig::from_toml_str(&content)
}
