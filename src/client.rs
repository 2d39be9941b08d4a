//! Spotify Accounts service client
//!
//! Builds authorization URLs and performs the two token-endpoint calls
//! (authorization-code exchange and refresh) as form-encoded POSTs. The
//! [`AuthorizationServer`] trait is the seam the flow and manager depend on,
//! so tests can substitute a mock server and count calls.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::{AuthError, AuthResult};

const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_SCOPES: &[&str] = &[
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
];

/// OAuth configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID registered with the provider
    pub client_id: String,
    /// Pre-registered redirect URI the callback arrives on
    pub redirect_uri: String,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Scopes to request, joined space-delimited in the authorization URL
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Create a configuration for the given application identity with the
    /// default Spotify endpoints and playback scopes
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Replace the requested scopes
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Space-delimited scope list as sent in the authorization request
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Raw token-endpoint response body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// A validated token-endpoint grant
///
/// `expires_in` is guaranteed positive; a response without a usable lifetime
/// is rejected as [`AuthError::InvalidResponse`] before it gets here.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// Bearer access token
    pub access_token: String,
    /// Refresh token, omitted by the provider on some flows
    pub refresh_token: Option<String>,
    /// Provider-reported access-token lifetime in seconds
    pub expires_in: u64,
}

impl TryFrom<TokenResponse> for TokenGrant {
    type Error = AuthError;

    fn try_from(response: TokenResponse) -> AuthResult<Self> {
        match response.expires_in {
            Some(secs) if secs > 0 => Ok(Self {
                access_token: response.access_token,
                refresh_token: response.refresh_token,
                expires_in: secs,
            }),
            // Absent or zero lifetime is a provider-protocol violation
            _ => Err(AuthError::InvalidResponse(
                "token response missing a positive expires_in".to_string(),
            )),
        }
    }
}

/// The identity-provider surface the lifecycle manager depends on
#[async_trait]
pub trait AuthorizationServer: Send + Sync {
    /// Build the authorization URL for a browser redirect
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is unparseable.
    fn authorization_url(&self, code_challenge: &str) -> AuthResult<Url>;

    /// Exchange an authorization code (plus the PKCE verifier) for tokens
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExchangeFailed`] on a non-success HTTP
    /// status, or transport/parse errors.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AuthResult<TokenGrant>;

    /// Obtain a new access token from a refresh token
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RefreshFailed`] on a non-success HTTP status,
    /// or transport/parse errors.
    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenGrant>;
}

/// HTTP implementation of [`AuthorizationServer`] backed by reqwest
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Create a client for the given configuration
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    async fn post_form(&self, params: &[(&str, &str)]) -> AuthResult<(u16, String)> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    fn parse_grant(body: &str) -> AuthResult<TokenGrant> {
        let response: TokenResponse = serde_json::from_str(body).map_err(|e| {
            AuthError::InvalidResponse(format!("failed to parse token response: {e}"))
        })?;
        TokenGrant::try_from(response)
    }
}

#[async_trait]
impl AuthorizationServer for OAuthClient {
    fn authorization_url(&self, code_challenge: &str) -> AuthResult<Url> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::InvalidConfig(format!("bad authorization URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", code_challenge)
            .append_pair("scope", &self.config.scope_string());

        Ok(url)
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AuthResult<TokenGrant> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];

        let (status, body) = self.post_form(&params).await?;
        if !(200..300).contains(&status) {
            tracing::warn!(status, "authorization-code exchange rejected");
            return Err(AuthError::TokenExchangeFailed { status, body });
        }

        Self::parse_grant(&body)
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenGrant> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let (status, body) = self.post_form(&params).await?;
        if !(200..300).contains(&status) {
            tracing::warn!(status, "token refresh rejected");
            return Err(AuthError::RefreshFailed { status, body });
        }

        Self::parse_grant(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> OAuthClient {
        OAuthClient::new(OAuthConfig::new(
            "client123",
            "https://example.com/callback.html",
        ))
    }

    #[test]
    fn test_config_defaults() {
        let config = OAuthConfig::new("id", "uri");
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(
            config.scope_string(),
            "user-read-playback-state user-modify-playback-state user-read-currently-playing"
        );
    }

    #[test]
    fn test_config_with_scopes_replaces_defaults() {
        let config = OAuthConfig::new("id", "uri")
            .with_scopes(vec!["streaming".to_string(), "user-read-email".to_string()]);
        assert_eq!(config.scope_string(), "streaming user-read-email");
    }

    #[test]
    fn test_authorization_url_parameters() {
        let url = test_client().authorization_url("challenge123").unwrap();

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(url.path(), "/authorize");

        let params: std::collections::HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params["client_id"], "client123");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "https://example.com/callback.html");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["code_challenge"], "challenge123");
        assert!(params["scope"].contains("user-read-playback-state"));
    }

    #[test]
    fn test_parse_grant_full_response() {
        let grant = OAuthClient::parse_grant(
            r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(grant.access_token, "a");
        assert_eq!(grant.refresh_token, Some("r".to_string()));
        assert_eq!(grant.expires_in, 3600);
    }

    #[test]
    fn test_parse_grant_without_refresh_token() {
        let grant =
            OAuthClient::parse_grant(r#"{"access_token":"a","expires_in":3600}"#).unwrap();
        assert_eq!(grant.refresh_token, None);
    }

    #[test]
    fn test_parse_grant_missing_expires_in_rejected() {
        let result = OAuthClient::parse_grant(r#"{"access_token":"a"}"#);
        assert!(matches!(result, Err(AuthError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_grant_zero_expires_in_rejected() {
        let result = OAuthClient::parse_grant(r#"{"access_token":"a","expires_in":0}"#);
        assert!(matches!(result, Err(AuthError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_grant_malformed_body_rejected() {
        let result = OAuthClient::parse_grant("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(AuthError::InvalidResponse(_))));
    }
}
