//! Authenticated caller identity and its claims

use serde_json::Value;
use std::fmt;

/// A single key/value fact attached to an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Claim type (e.g. "sub", "role", "resource_access")
    pub claim_type: String,
    /// Claim value
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The scheme a caller was authenticated under, with the bearer token stored for it
#[derive(Clone, PartialEq, Eq)]
pub struct Authentication {
    /// Authentication scheme name (e.g. "Bearer")
    pub scheme: String,
    /// Access token presented by the caller
    pub access_token: Option<String>,
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("scheme", &self.scheme)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The caller of one request.
///
/// Claims keep insertion order and may repeat a type, so an identity can hold
/// several `role` claims. Identities live for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    authentication: Option<Authentication>,
    claims: Vec<Claim>,
}

impl Identity {
    /// An identity that never authenticated
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An identity authenticated under `scheme`, optionally carrying its bearer token
    pub fn authenticated(scheme: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            authentication: Some(Authentication {
                scheme: scheme.into(),
                access_token,
            }),
            claims: Vec::new(),
        }
    }

    /// Build an identity from an already validated token payload.
    ///
    /// Top-level members become claims: strings as-is, numbers and booleans
    /// stringified, arrays one claim per element and nested objects as
    /// compact JSON. `null` members are skipped.
    ///
    /// ```rust
    /// use keycloak_pep::Identity;
    /// use serde_json::json;
    ///
    /// let payload = json!({
    ///     "sub": "user-1",
    ///     "resource_access": { "my-api": { "roles": ["ops"] } }
    /// });
    /// let identity = Identity::from_token_claims("Bearer", "token".to_string(), &payload);
    /// assert_eq!(identity.find_first("sub"), Some("user-1"));
    /// assert_eq!(
    ///     identity.find_first("resource_access"),
    ///     Some(r#"{"my-api":{"roles":["ops"]}}"#)
    /// );
    /// ```
    pub fn from_token_claims(scheme: impl Into<String>, access_token: String, payload: &Value) -> Self {
        let mut identity = Self::authenticated(scheme, Some(access_token));
        if let Value::Object(members) = payload {
            for (claim_type, value) in members {
                match value {
                    Value::Array(items) => {
                        for item in items {
                            if let Some(v) = claim_value(item) {
                                identity.add_claim(Claim::new(claim_type.as_str(), v));
                            }
                        }
                    }
                    other => {
                        if let Some(v) = claim_value(other) {
                            identity.add_claim(Claim::new(claim_type.as_str(), v));
                        }
                    }
                }
            }
        }
        identity
    }

    /// Builder-style claim append
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_claim(Claim::new(claim_type, value));
        self
    }

    /// Append a claim. Claims are never removed.
    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }

    /// Whether the caller authenticated under any scheme
    pub fn is_authenticated(&self) -> bool {
        self.authentication.is_some()
    }

    /// Whether the caller authenticated under exactly `scheme`
    pub fn is_authenticated_with(&self, scheme: &str) -> bool {
        self.authentication
            .as_ref()
            .is_some_and(|auth| auth.scheme == scheme)
    }

    /// Bearer token stored for `scheme`, if the caller authenticated under it
    pub fn access_token(&self, scheme: &str) -> Option<&str> {
        self.authentication
            .as_ref()
            .filter(|auth| auth.scheme == scheme)
            .and_then(|auth| auth.access_token.as_deref())
            .filter(|token| !token.trim().is_empty())
    }

    /// First claim value of the given type
    pub fn find_first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// All claim values of the given type, in insertion order
    pub fn values_of<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }
}

fn claim_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}
