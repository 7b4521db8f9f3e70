use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Rejections produced by the PEP middleware.
///
/// Messages never include details from the authorization server.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    /// No authenticated identity on the request
    #[error("Missing authentication token")]
    MissingToken,

    /// Token or token-derived data could not be used
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The authorization server did not grant the permission
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Required role was not found among the identity's role claims
    #[error("Insufficient role. Required one of: {}", .0.join(", "))]
    InsufficientRole(Vec<String>),
}

impl IntoResponse for AuthorizationError {
    fn into_response(self) -> Response {
        match self {
            AuthorizationError::MissingToken | AuthorizationError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            AuthorizationError::PermissionDenied(_) | AuthorizationError::InsufficientRole(_) => {
                (StatusCode::FORBIDDEN, self.to_string()).into_response()
            }
        }
    }
}
