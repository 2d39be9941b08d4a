//! Error types for the token lifecycle manager

use thiserror::Error;

use crate::store::StoreError;

/// Main error type for token lifecycle operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider rejected the consent request
    #[error("Authorization denied by provider: {0}")]
    AuthorizationDenied(String),

    /// Callback carried neither a code nor an error parameter
    #[error("Callback missing authorization code")]
    MissingCode,

    /// No PKCE verifier in storage - the callback arrived without a matching
    /// prior `begin_login`, or storage was cleared between the two steps
    #[error("No PKCE verifier stored; start a new login")]
    MissingVerifier,

    /// Token endpoint rejected the authorization-code exchange
    #[error("Token exchange failed with HTTP {status}: {body}")]
    TokenExchangeFailed {
        /// HTTP status code returned by the token endpoint
        status: u16,
        /// Raw response body, exposed for diagnostics but not interpreted
        body: String,
    },

    /// Token endpoint rejected the refresh request
    #[error("Token refresh failed with HTTP {status}: {body}")]
    RefreshFailed {
        /// HTTP status code returned by the token endpoint
        status: u16,
        /// Raw response body, exposed for diagnostics but not interpreted
        body: String,
    },

    /// No refresh token stored - the user must log in again
    #[error("No refresh token available (login again)")]
    NoRefreshToken,

    /// Token endpoint returned a body that is not a usable token response
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration (unparseable endpoint URL, empty client id)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Credential storage error
    #[error("Credential storage error: {0}")]
    Storage(#[from] StoreError),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Browser navigation to the authorization URL failed
    #[error("Could not navigate to authorization URL: {0}")]
    Navigation(String),
}

/// Result type alias for token lifecycle operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_carry_status() {
        let err = AuthError::RefreshFailed {
            status: 400,
            body: "invalid_grant".to_string(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("invalid_grant"));

        let err = AuthError::TokenExchangeFailed {
            status: 503,
            body: String::new(),
        };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_no_refresh_token_message_prompts_login() {
        assert!(
            AuthError::NoRefreshToken
                .to_string()
                .contains("login again")
        );
    }
}
