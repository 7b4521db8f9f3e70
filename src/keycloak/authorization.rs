//! UMA permission checks against the Keycloak token endpoint

use std::sync::Arc;

use http::StatusCode;
use tokio_util::sync::CancellationToken;

use super::transport::{PermissionTransport, ReqwestTransport};
use super::types::{AuthorizationOptions, PermissionDecision, PermissionRequest, RequestRejection};
use crate::error::Result;
use crate::identity::Identity;

/// Why a permission check ended in a denial.
///
/// Only meant for logs and tests. Callers of [`PermissionEvaluator::evaluate`]
/// see a plain [`PermissionDecision::Denied`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    #[error("caller is not authenticated under the required scheme")]
    Unauthenticated,

    #[error("permission name is empty")]
    EmptyPermission,

    #[error("authorization server unreachable: {0}")]
    EndpointUnreachable(String),

    #[error("authorization server responded with {0}")]
    EndpointRejected(StatusCode),

    #[error("permission check timed out")]
    TimedOut,
}

impl From<RequestRejection> for DenyReason {
    fn from(rejection: RequestRejection) -> Self {
        match rejection {
            RequestRejection::Unauthenticated => DenyReason::Unauthenticated,
            RequestRejection::EmptyPermission => DenyReason::EmptyPermission,
        }
    }
}

/// Asks the authorization server whether the caller holds a permission.
///
/// Each evaluation issues exactly one request, authenticated with the
/// caller's own bearer token. Decisions are never cached or retried.
#[derive(Clone)]
pub struct PermissionEvaluator {
    options: Arc<AuthorizationOptions>,
    transport: Arc<dyn PermissionTransport>,
}

impl PermissionEvaluator {
    /// Create an evaluator using the default `reqwest` transport
    pub fn new(options: AuthorizationOptions) -> Result<Self> {
        options.validate()?;
        let transport = ReqwestTransport::new(options.timeout)?;
        Ok(Self {
            options: Arc::new(options),
            transport: Arc::new(transport),
        })
    }

    /// Create an evaluator with a custom transport
    pub fn with_transport(options: AuthorizationOptions, transport: Arc<dyn PermissionTransport>) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options: Arc::new(options),
            transport,
        })
    }

    pub fn options(&self) -> &AuthorizationOptions {
        &self.options
    }

    /// Decide whether `identity` holds `permission`
    pub async fn evaluate(&self, identity: &Identity, permission: &str) -> PermissionDecision {
        match self.check(identity, permission).await {
            Ok(()) => {
                tracing::debug!("Permission {} granted", permission);
                PermissionDecision::Granted
            }
            Err(reason) => {
                match &reason {
                    DenyReason::EndpointUnreachable(_) | DenyReason::TimedOut => {
                        tracing::warn!("Permission {} denied: {}", permission, reason);
                    }
                    _ => tracing::debug!("Permission {} denied: {}", permission, reason),
                }
                PermissionDecision::Denied
            }
        }
    }

    /// Like [`evaluate`](Self::evaluate), abandoning the call when `cancel` fires
    pub async fn evaluate_until_cancelled(
        &self,
        identity: &Identity,
        permission: &str,
        cancel: &CancellationToken,
    ) -> PermissionDecision {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Permission {} check cancelled", permission);
                PermissionDecision::Denied
            }
            decision = self.evaluate(identity, permission) => decision,
        }
    }

    /// Run the check and report why it was denied
    pub async fn check(&self, identity: &Identity, permission: &str) -> std::result::Result<(), DenyReason> {
        // No request leaves the process unless the caller is authenticated
        let request = PermissionRequest::for_identity(identity, permission, &self.options)?;

        let status = tokio::time::timeout(
            self.options.timeout,
            self.transport
                .post_form(&self.options.token_endpoint, request.bearer_token(), &request.form()),
        )
        .await
        .map_err(|_| DenyReason::TimedOut)?
        .map_err(|e| DenyReason::EndpointUnreachable(e.to_string()))?;

        if status.is_success() {
            Ok(())
        } else {
            Err(DenyReason::EndpointRejected(status))
        }
    }
}
