//! Error types for PEP operations

/// PEP-specific error type
#[derive(Debug, thiserror::Error)]
pub enum PepError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// `resource_access` is present but does not have the expected shape
    #[error("Malformed claim data: {0}")]
    ClaimDataMalformed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = PepError::Config("token_endpoint is required".to_string());
        assert_eq!(err.to_string(), "Configuration error: token_endpoint is required");
    }

    #[test]
    fn test_internal_error_conversion() {
        let err: PepError = anyhow::anyhow!("unknown signing key").into();
        assert!(matches!(err, PepError::Internal(_)));
        assert_eq!(err.to_string(), "Internal error: unknown signing key");
    }
}
