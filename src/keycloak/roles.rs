//! Derive role claims from Keycloak's `resource_access` claim

use serde_json::Value;

use super::types::{RoleClaimsOptions, RESOURCE_ACCESS_CLAIM};
use crate::error::{PepError, Result};
use crate::identity::{Claim, Identity};

/// Copies the client roles of one audience out of `resource_access`.
///
/// `resource_access` arrives as a JSON-encoded claim shaped like
/// `{"<audience>": {"roles": ["<role>", ...]}}`. Missing data is not an
/// error; data of the wrong shape is.
#[derive(Debug, Clone)]
pub struct RoleClaimsEnricher {
    options: RoleClaimsOptions,
}

impl RoleClaimsEnricher {
    pub fn new(options: RoleClaimsOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &RoleClaimsOptions {
        &self.options
    }

    /// Return a copy of `identity` with the derived role claims appended
    pub fn enrich(&self, identity: &Identity) -> Result<Identity> {
        let mut enriched = identity.clone();
        self.enrich_in_place(&mut enriched)?;
        Ok(enriched)
    }

    /// Append the derived role claims and return how many were added.
    ///
    /// On error the identity is left untouched.
    pub fn enrich_in_place(&self, identity: &mut Identity) -> Result<usize> {
        if !identity.is_authenticated() {
            return Ok(0);
        }

        let roles = match identity.find_first(RESOURCE_ACCESS_CLAIM) {
            Some(raw) if !raw.trim().is_empty() => self.audience_roles(raw)?,
            _ => return Ok(0),
        };

        let added = roles.len();
        for role in roles {
            identity.add_claim(Claim::new(self.options.role_claim_type.as_str(), role));
        }
        tracing::debug!(
            "Added {} {} claims for audience {}",
            added,
            self.options.role_claim_type,
            self.options.audience
        );
        Ok(added)
    }

    /// Non-blank roles listed for the configured audience, in source order
    fn audience_roles(&self, raw: &str) -> Result<Vec<String>> {
        let resource_access: Value = serde_json::from_str(raw).map_err(|e| {
            tracing::warn!("resource_access claim is not valid JSON: {}", e);
            PepError::ClaimDataMalformed(format!("resource_access is not valid JSON: {}", e))
        })?;

        let Value::Object(audiences) = resource_access else {
            return Err(malformed("resource_access is not an object"));
        };

        let client = match audiences.get(&self.options.audience) {
            None => return Ok(Vec::new()),
            Some(Value::Object(client)) => client,
            Some(_) => return Err(malformed(format!("resource_access.{} is not an object", self.options.audience))),
        };

        let roles = match client.get("roles") {
            None => return Ok(Vec::new()),
            Some(Value::Array(roles)) => roles,
            Some(_) => return Err(malformed(format!("resource_access.{}.roles is not an array", self.options.audience))),
        };

        let mut collected = Vec::with_capacity(roles.len());
        for role in roles {
            match role {
                Value::String(name) if name.trim().is_empty() => {}
                Value::String(name) => collected.push(name.clone()),
                other => {
                    return Err(malformed(format!(
                        "resource_access.{}.roles contains a non-string entry: {}",
                        self.options.audience, other
                    )))
                }
            }
        }
        Ok(collected)
    }
}

fn malformed(message: impl Into<String>) -> PepError {
    let message = message.into();
    tracing::warn!("{}", message);
    PepError::ClaimDataMalformed(message)
}
