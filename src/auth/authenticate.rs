use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Layer;
use tower::Service;

use crate::axum_integration::extract_bearer_token;
use crate::error::PepError;
use crate::identity::Identity;
use crate::keycloak::DEFAULT_AUTHENTICATION_SCHEME;

/// Verifies a bearer token and returns its claims payload.
///
/// Signature, issuer, audience and expiry checks happen here; this crate
/// only consumes the result.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Value, PepError>;
}

/// Middleware layer that turns a valid bearer token into a request [`Identity`]
///
/// Requests without a token, or with one the validator rejects, continue
/// without an identity.
#[derive(Clone)]
pub struct Authenticate {
    validator: Arc<dyn TokenValidator>,
    scheme: Arc<str>,
}

impl Authenticate {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self::with_scheme(validator, DEFAULT_AUTHENTICATION_SCHEME)
    }

    /// Record authenticated identities under `scheme`
    pub fn with_scheme(validator: Arc<dyn TokenValidator>, scheme: impl Into<String>) -> Self {
        Self {
            validator,
            scheme: Arc::from(scheme.into()),
        }
    }
}

impl<S> Layer<S> for Authenticate {
    type Service = AuthenticateMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticateMiddleware {
            inner,
            validator: self.validator.clone(),
            scheme: self.scheme.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthenticateMiddleware<S> {
    inner: S,
    validator: Arc<dyn TokenValidator>,
    scheme: Arc<str>,
}

impl<S> Service<Request> for AuthenticateMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let validator = self.validator.clone();
        let scheme = self.scheme.clone();

        Box::pin(async move {
            let token = extract_bearer_token(request.headers());
            if let Some(token) = token {
                match validator.validate(&token).await {
                    Ok(payload) => {
                        let identity = Identity::from_token_claims(scheme.as_ref(), token, &payload);
                        request.extensions_mut().insert(identity);
                    }
                    Err(e) => tracing::debug!("Bearer token rejected: {}", e),
                }
            }

            inner.call(request).await
        })
    }
}
