//! Authorization initiation and callback processing
//!
//! [`LoginFlow::begin_login`] starts an authorization attempt: it generates
//! and persists a PKCE verifier, then hands the authorization URL to the
//! injected [`Navigator`] (control leaves the application through a browser
//! redirect). [`LoginFlow::process_callback`] runs on the redirect back and
//! exchanges the authorization code for the initial token record.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::client::AuthorizationServer;
use crate::error::{AuthError, AuthResult};
use crate::pkce::PkceChallenge;
use crate::store::{CredentialKey, CredentialStore};
use crate::token::{self, TokenRecord};

/// Navigation seam for the full-page authorization redirect
///
/// Production code uses [`SystemBrowser`]; tests inject a recording
/// implementation so no browser is needed.
pub trait Navigator: Send + Sync {
    /// Navigate the user to the given URL
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Navigation`] if the browsing context cannot be
    /// reached.
    fn navigate(&self, url: &Url) -> AuthResult<()>;
}

/// Opens URLs in the default system browser
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl Navigator for SystemBrowser {
    fn navigate(&self, url: &Url) -> AuthResult<()> {
        #[cfg(target_os = "macos")]
        {
            std::process::Command::new("open")
                .arg(url.as_str())
                .spawn()
                .map_err(|e| AuthError::Navigation(e.to_string()))?;
        }

        #[cfg(target_os = "linux")]
        {
            std::process::Command::new("xdg-open")
                .arg(url.as_str())
                .spawn()
                .map_err(|e| AuthError::Navigation(e.to_string()))?;
        }

        #[cfg(target_os = "windows")]
        {
            std::process::Command::new("cmd")
                .args(["/C", "start", "", url.as_str()])
                .spawn()
                .map_err(|e| AuthError::Navigation(e.to_string()))?;
        }

        Ok(())
    }
}

/// Query parameters delivered to the redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Single-use authorization code, present on user consent
    pub code: Option<String>,
    /// Provider error code, present on denial
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parse the raw query string of a callback invocation
    ///
    /// Accepts the string with or without a leading `?`; parameters other
    /// than `code` and `error` are ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    /// Parse the query of a full redirect URL
    #[must_use]
    pub fn from_redirect_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or(""))
    }
}

/// Authorization initiator and callback processor
pub struct LoginFlow<C, S> {
    server: Arc<C>,
    store: Arc<S>,
    navigator: Box<dyn Navigator>,
}

impl<C: AuthorizationServer, S: CredentialStore> LoginFlow<C, S> {
    /// Create a flow navigating via the system browser
    #[must_use]
    pub fn new(server: Arc<C>, store: Arc<S>) -> Self {
        Self {
            server,
            store,
            navigator: Box::new(SystemBrowser),
        }
    }

    /// Replace the navigator (testing, embedded webviews)
    #[must_use]
    pub fn with_navigator(mut self, navigator: Box<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Start an authorization attempt
    ///
    /// Generates a fresh verifier (silently overwriting any stale one from
    /// an abandoned attempt), persists it, and navigates to the provider's
    /// authorization page. On success control leaves the application; the
    /// next step is [`Self::process_callback`] on the redirect back.
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier cannot be persisted or navigation
    /// fails.
    pub fn begin_login(&self) -> AuthResult<()> {
        let pkce = PkceChallenge::generate();
        self.store.set(CredentialKey::Verifier, &pkce.verifier)?;

        let url = self.server.authorization_url(&pkce.challenge)?;
        debug!("redirecting to authorization endpoint");
        self.navigator.navigate(&url)
    }

    /// Exchange the callback's authorization code for the initial tokens
    ///
    /// Precondition: must complete (success or failure) before any token
    /// accessor call is expected to observe the resulting record - run it on
    /// the dedicated callback page load, not concurrently with dashboard
    /// reads.
    ///
    /// On success the token record is written to the store and the consumed
    /// verifier is removed. On any failure the previously stored fields are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// * [`AuthError::AuthorizationDenied`] - provider returned an `error`
    ///   parameter (no network call is made)
    /// * [`AuthError::MissingCode`] - neither `code` nor `error` present
    /// * [`AuthError::MissingVerifier`] - no stored verifier to pair with
    ///   the code (no network call is made)
    /// * [`AuthError::TokenExchangeFailed`] - token endpoint returned a
    ///   non-success status
    pub async fn process_callback(&self, params: &CallbackParams) -> AuthResult<TokenRecord> {
        if let Some(error) = &params.error {
            return Err(AuthError::AuthorizationDenied(error.clone()));
        }
        let Some(code) = &params.code else {
            return Err(AuthError::MissingCode);
        };

        let verifier = self
            .store
            .get(CredentialKey::Verifier)?
            .ok_or(AuthError::MissingVerifier)?;

        let grant = self.server.exchange_code(code, &verifier).await?;

        let record = token::persist_grant(self.store.as_ref(), &grant)?;
        self.store.delete(CredentialKey::Verifier)?;

        info!("authorization code exchanged, credentials stored");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_params_from_query() {
        let params = CallbackParams::from_query("code=abc123&state=xyz");
        assert_eq!(params.code, Some("abc123".to_string()));
        assert_eq!(params.error, None);
    }

    #[test]
    fn test_callback_params_leading_question_mark() {
        let params = CallbackParams::from_query("?error=access_denied");
        assert_eq!(params.error, Some("access_denied".to_string()));
        assert_eq!(params.code, None);
    }

    #[test]
    fn test_callback_params_empty_query() {
        assert_eq!(CallbackParams::from_query(""), CallbackParams::default());
    }

    #[test]
    fn test_callback_params_percent_decoding() {
        let params = CallbackParams::from_query("code=a%2Bb%3Dc");
        assert_eq!(params.code, Some("a+b=c".to_string()));
    }

    #[test]
    fn test_callback_params_from_redirect_url() {
        let url = Url::parse("https://example.com/callback.html?code=c1").unwrap();
        let params = CallbackParams::from_redirect_url(&url);
        assert_eq!(params.code, Some("c1".to_string()));
    }
}
