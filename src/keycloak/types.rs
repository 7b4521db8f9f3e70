//! Common types for Keycloak authorization

use std::time::Duration;

use crate::error::{PepError, Result};
use crate::identity::Identity;

/// Grant type asking the token endpoint for a ticket-based permission check
pub const UMA_TICKET_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:uma-ticket";

/// Response mode requesting a decision instead of an RPT
pub const DECISION_RESPONSE_MODE: &str = "decision";

/// Claim holding the per-audience role structure
pub const RESOURCE_ACCESS_CLAIM: &str = "resource_access";

/// Claim type used for derived role claims
pub const DEFAULT_ROLE_CLAIM_TYPE: &str = "role";

/// Scheme name of bearer-token authentication
pub const DEFAULT_AUTHENTICATION_SCHEME: &str = "Bearer";

/// Upper bound on a single permission check
pub const DEFAULT_PERMISSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionDecision {
    Granted,
    #[default]
    Denied,
}

impl PermissionDecision {
    pub fn is_granted(self) -> bool {
        self == PermissionDecision::Granted
    }
}

/// Settings for reaching the authorization server
#[derive(Debug, Clone)]
pub struct AuthorizationOptions {
    /// Scheme the caller must be authenticated under
    pub required_scheme: String,
    /// Token endpoint URL of the realm
    pub token_endpoint: String,
    /// Client ID of the resource server that owns the permissions
    pub audience: String,
    /// Bound applied to each permission check
    pub timeout: Duration,
}

impl AuthorizationOptions {
    /// Options with the default scheme and timeout
    pub fn new(token_endpoint: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            required_scheme: DEFAULT_AUTHENTICATION_SCHEME.to_string(),
            token_endpoint: token_endpoint.into(),
            audience: audience.into(),
            timeout: DEFAULT_PERMISSION_TIMEOUT,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.required_scheme.trim().is_empty() {
            return Err(PepError::Config("required_scheme must not be empty".to_string()));
        }
        if self.token_endpoint.trim().is_empty() {
            return Err(PepError::Config("token_endpoint is required".to_string()));
        }
        if self.audience.trim().is_empty() {
            return Err(PepError::Config("audience is required".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(PepError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Settings for deriving role claims
#[derive(Debug, Clone)]
pub struct RoleClaimsOptions {
    /// Key under `resource_access` whose roles are copied
    pub audience: String,
    /// Claim type of the derived claims
    pub role_claim_type: String,
}

impl RoleClaimsOptions {
    pub fn new(audience: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            role_claim_type: DEFAULT_ROLE_CLAIM_TYPE.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.audience.trim().is_empty() {
            return Err(PepError::Config("roles audience is required".to_string()));
        }
        if self.role_claim_type.trim().is_empty() {
            return Err(PepError::Config("role_claim_type must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Input of a single permission check
#[derive(Clone, PartialEq, Eq)]
pub struct PermissionRequest {
    permission: String,
    bearer_token: String,
    audience: String,
}

impl std::fmt::Debug for PermissionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionRequest")
            .field("permission", &self.permission)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

/// Why a [`PermissionRequest`] could not be built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRejection {
    /// Not authenticated under the required scheme, or no token stored for it
    Unauthenticated,
    /// Permission name was empty
    EmptyPermission,
}

impl PermissionRequest {
    /// Build a request for `permission` on behalf of `identity`
    pub fn for_identity(
        identity: &Identity,
        permission: &str,
        options: &AuthorizationOptions,
    ) -> std::result::Result<Self, RequestRejection> {
        if !identity.is_authenticated_with(&options.required_scheme) {
            return Err(RequestRejection::Unauthenticated);
        }
        let bearer_token = identity
            .access_token(&options.required_scheme)
            .ok_or(RequestRejection::Unauthenticated)?;
        if permission.trim().is_empty() {
            return Err(RequestRejection::EmptyPermission);
        }

        Ok(Self {
            permission: permission.to_string(),
            bearer_token: bearer_token.to_string(),
            audience: options.audience.clone(),
        })
    }

    pub fn permission(&self) -> &str {
        &self.permission
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Form fields of the decision request, in wire order
    pub fn form(&self) -> [(&'static str, &str); 4] {
        [
            ("grant_type", UMA_TICKET_GRANT_TYPE),
            ("response_mode", DECISION_RESPONSE_MODE),
            ("audience", &self.audience),
            ("permission", &self.permission),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> AuthorizationOptions {
        AuthorizationOptions::new("https://kc.example.com/token", "my-api")
    }

    #[test]
    fn test_default_options() {
        let options = options();
        assert_eq!(options.required_scheme, "Bearer");
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_options_validation() {
        let mut missing_endpoint = options();
        missing_endpoint.token_endpoint = String::new();
        assert!(matches!(missing_endpoint.validate(), Err(PepError::Config(_))));

        let mut missing_audience = options();
        missing_audience.audience = " ".to_string();
        assert!(matches!(missing_audience.validate(), Err(PepError::Config(_))));

        let mut zero_timeout = options();
        zero_timeout.timeout = Duration::ZERO;
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_role_options_defaults() {
        let options = RoleClaimsOptions::new("my-api");
        assert_eq!(options.role_claim_type, "role");
        assert!(options.validate().is_ok());
        assert!(RoleClaimsOptions::new("").validate().is_err());
    }

    #[test]
    fn test_request_form_fields() {
        let identity = Identity::authenticated("Bearer", Some("tok".to_string()));
        let request = PermissionRequest::for_identity(&identity, "queue:read", &options()).unwrap();

        assert_eq!(request.bearer_token(), "tok");
        assert_eq!(
            request.form(),
            [
                ("grant_type", "urn:ietf:params:oauth:grant-type:uma-ticket"),
                ("response_mode", "decision"),
                ("audience", "my-api"),
                ("permission", "queue:read"),
            ]
        );
    }

    #[test]
    fn test_request_rejections() {
        let options = options();

        let anonymous = Identity::anonymous();
        assert_eq!(
            PermissionRequest::for_identity(&anonymous, "p", &options),
            Err(RequestRejection::Unauthenticated)
        );

        let other_scheme = Identity::authenticated("Cookies", Some("tok".to_string()));
        assert_eq!(
            PermissionRequest::for_identity(&other_scheme, "p", &options),
            Err(RequestRejection::Unauthenticated)
        );

        let no_token = Identity::authenticated("Bearer", None);
        assert_eq!(
            PermissionRequest::for_identity(&no_token, "p", &options),
            Err(RequestRejection::Unauthenticated)
        );

        let identity = Identity::authenticated("Bearer", Some("tok".to_string()));
        assert_eq!(
            PermissionRequest::for_identity(&identity, "  ", &options),
            Err(RequestRejection::EmptyPermission)
        );
    }

    #[test]
    fn test_request_debug_hides_token() {
        let identity = Identity::authenticated("Bearer", Some("secret-token".to_string()));
        let request = PermissionRequest::for_identity(&identity, "p", &options()).unwrap();
        assert!(!format!("{:?}", request).contains("secret-token"));
    }

    #[test]
    fn test_decision_default_is_denied() {
        assert_eq!(PermissionDecision::default(), PermissionDecision::Denied);
        assert!(PermissionDecision::Granted.is_granted());
        assert!(!PermissionDecision::Denied.is_granted());
    }
}
