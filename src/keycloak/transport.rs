//! Transport used to reach the token endpoint

use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::error::Result;

/// Failure to obtain any response from the authorization server
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("authorization server unreachable: {0}")]
    Unreachable(String),
}

/// Sends permission-check forms to the authorization server.
///
/// Implementations are shared by every concurrent evaluation and must not
/// keep per-call state.
#[async_trait]
pub trait PermissionTransport: Send + Sync {
    /// POST `form` as `application/x-www-form-urlencoded` to `endpoint`,
    /// authenticated with `bearer_token`, and return the response status
    async fn post_form(
        &self,
        endpoint: &str,
        bearer_token: &str,
        form: &[(&str, &str)],
    ) -> std::result::Result<StatusCode, TransportError>;
}

/// Default transport backed by `reqwest`
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests give up after `timeout`.
    ///
    /// Redirects are never followed: a 3xx from the token endpoint is the
    /// decision returned to the evaluator.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self::from_client(http_client))
    }

    /// Wrap an existing client. The caller owns its redirect policy and timeout.
    pub fn from_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl PermissionTransport for ReqwestTransport {
    async fn post_form(
        &self,
        endpoint: &str,
        bearer_token: &str,
        form: &[(&str, &str)],
    ) -> std::result::Result<StatusCode, TransportError> {
        tracing::debug!("Sending permission check to: {}", endpoint);

        let response = self
            .http_client
            .post(endpoint)
            .bearer_auth(bearer_token)
            .form(form)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::keycloak::{AuthorizationOptions, DenyReason, PermissionDecision, PermissionEvaluator};
    use axum::http::header;
    use axum::routing::get;
    use axum::{extract::Form, http::HeaderMap, routing::post, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

    async fn spawn_token_endpoint(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let app = Router::new().route(
            "/token",
            post(move |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| {
                let sink = sink.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(|v| v.to_string());
                    sink.lock().unwrap().push((auth, form));
                    status
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/token", addr), captured)
    }

    #[tokio::test]
    async fn test_posts_form_with_bearer_auth() {
        let (endpoint, captured) = spawn_token_endpoint(StatusCode::OK).await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let status = transport
            .post_form(
                &endpoint,
                "caller-token",
                &[("grant_type", "urn:ietf:params:oauth:grant-type:uma-ticket"), ("permission", "queue:read")],
            )
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);

        let calls = captured.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (auth, form) = &calls[0];
        assert_eq!(auth.as_deref(), Some("Bearer caller-token"));
        assert_eq!(form.get("permission").map(String::as_str), Some("queue:read"));
        assert_eq!(
            form.get("grant_type").map(String::as_str),
            Some("urn:ietf:params:oauth:grant-type:uma-ticket")
        );
    }

    #[tokio::test]
    async fn test_returns_non_success_status() {
        let (endpoint, _captured) = spawn_token_endpoint(StatusCode::FORBIDDEN).await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let status = transport.post_form(&endpoint, "t", &[("permission", "p")]).await.unwrap();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let result = transport
            .post_form(&format!("http://{}/token", addr), "t", &[("permission", "p")])
            .await;
        assert!(matches!(result, Err(TransportError::Unreachable(_))));
    }

    /// Token endpoint that bounces POSTs to a login page answering 200
    async fn spawn_redirecting_endpoint() -> String {
        let app = Router::new()
            .route("/token", post(|| async { (StatusCode::FOUND, [(header::LOCATION, "/login")]) }))
            .route("/login", get(|| async { StatusCode::OK }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/token", addr)
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let endpoint = spawn_redirecting_endpoint().await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let status = transport.post_form(&endpoint, "t", &[("permission", "p")]).await.unwrap();
        assert_eq!(status, StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_redirect_denies_permission() {
        let endpoint = spawn_redirecting_endpoint().await;
        let evaluator = PermissionEvaluator::new(AuthorizationOptions::new(&endpoint, "my-api")).unwrap();
        let identity = Identity::authenticated("Bearer", Some("caller-token".to_string()));

        assert_eq!(evaluator.evaluate(&identity, "queue:read").await, PermissionDecision::Denied);
        assert_eq!(
            evaluator.check(&identity, "queue:read").await,
            Err(DenyReason::EndpointRejected(StatusCode::FOUND))
        );
    }
}
