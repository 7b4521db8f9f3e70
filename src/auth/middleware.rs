use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Layer;
use tower::Service;

use super::error::AuthorizationError;
use crate::identity::Identity;
use crate::keycloak::{PermissionDecision, PermissionEvaluator, RoleClaimsEnricher};

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Middleware layer that appends `resource_access` roles to the request's identity
#[derive(Clone)]
pub struct EnrichRoles {
    enricher: Arc<RoleClaimsEnricher>,
}

impl EnrichRoles {
    pub fn new(enricher: RoleClaimsEnricher) -> Self {
        Self {
            enricher: Arc::new(enricher),
        }
    }
}

impl<S> Layer<S> for EnrichRoles {
    type Service = EnrichRolesMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EnrichRolesMiddleware {
            inner,
            enricher: self.enricher.clone(),
        }
    }
}

#[derive(Clone)]
pub struct EnrichRolesMiddleware<S> {
    inner: S,
    enricher: Arc<RoleClaimsEnricher>,
}

impl<S> Service<Request> for EnrichRolesMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let enricher = self.enricher.clone();

        Box::pin(async move {
            // Requests without an identity are left for downstream layers to reject
            if let Some(identity) = request.extensions_mut().get_mut::<Identity>() {
                if enricher.enrich_in_place(identity).is_err() {
                    return Ok(AuthorizationError::InvalidToken("role claims unusable".to_string()).into_response());
                }
            }

            inner.call(request).await
        })
    }
}

/// Middleware layer that requires a permission granted by the authorization server
#[derive(Clone)]
pub struct RequirePermission {
    evaluator: Arc<PermissionEvaluator>,
    permission: Arc<str>,
}

impl RequirePermission {
    /// Require `permission` (e.g. `"queue#read"` or `"queue:read"`) for every request
    pub fn new(evaluator: PermissionEvaluator, permission: impl Into<String>) -> Self {
        Self::shared(Arc::new(evaluator), permission)
    }

    /// Share one evaluator between several routes
    pub fn shared(evaluator: Arc<PermissionEvaluator>, permission: impl Into<String>) -> Self {
        Self {
            evaluator,
            permission: Arc::from(permission.into()),
        }
    }
}

impl<S> Layer<S> for RequirePermission {
    type Service = RequirePermissionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermissionMiddleware {
            inner,
            evaluator: self.evaluator.clone(),
            permission: self.permission.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequirePermissionMiddleware<S> {
    inner: S,
    evaluator: Arc<PermissionEvaluator>,
    permission: Arc<str>,
}

impl<S> Service<Request> for RequirePermissionMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let evaluator = self.evaluator.clone();
        let permission = self.permission.clone();

        Box::pin(async move {
            let Some(identity) = request.extensions().get::<Identity>().cloned() else {
                return Ok(AuthorizationError::MissingToken.into_response());
            };

            // Dropping this future abandons the check; the request never reaches `inner`
            if evaluator.evaluate(&identity, &permission).await != PermissionDecision::Granted {
                return Ok(AuthorizationError::PermissionDenied(permission.to_string()).into_response());
            }

            inner.call(request).await
        })
    }
}

/// Middleware layer that requires one of the specified roles
#[derive(Clone)]
pub struct RequireRole {
    role_claim_type: Arc<str>,
    required_roles: Arc<Vec<String>>,
}

impl RequireRole {
    /// Require at least one of `required_roles` among `role` claims
    pub fn new(required_roles: Vec<String>) -> Self {
        Self::with_claim_type(crate::keycloak::DEFAULT_ROLE_CLAIM_TYPE, required_roles)
    }

    pub fn with_claim_type(role_claim_type: impl Into<String>, required_roles: Vec<String>) -> Self {
        Self {
            role_claim_type: Arc::from(role_claim_type.into()),
            required_roles: Arc::new(required_roles),
        }
    }
}

impl<S> Layer<S> for RequireRole {
    type Service = RequireRoleMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRoleMiddleware {
            inner,
            role_claim_type: self.role_claim_type.clone(),
            required_roles: self.required_roles.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequireRoleMiddleware<S> {
    inner: S,
    role_claim_type: Arc<str>,
    required_roles: Arc<Vec<String>>,
}

impl<S> Service<Request> for RequireRoleMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let role_claim_type = self.role_claim_type.clone();
        let required_roles = self.required_roles.clone();

        Box::pin(async move {
            let has_required_role = match request.extensions().get::<Identity>() {
                Some(identity) => required_roles
                    .iter()
                    .any(|role| identity.has_role(&role_claim_type, role)),
                None => return Ok(AuthorizationError::MissingToken.into_response()),
            };
            if !has_required_role {
                return Ok(AuthorizationError::InsufficientRole(required_roles.to_vec()).into_response());
            }

            inner.call(request).await
        })
    }
}
