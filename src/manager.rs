//! Token accessor with transparent refresh
//!
//! [`TokenManager::get_access_token`] is the single entry point API callers
//! use: it serves a stored token while it is fresh and otherwise refreshes
//! through the token endpoint. Refreshes are single-flight - concurrent
//! callers that observe expiry at the same time serialize on one in-flight
//! refresh and share its result instead of each issuing their own request.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::AuthorizationServer;
use crate::error::{AuthError, AuthResult};
use crate::store::{CredentialKey, CredentialStore};
use crate::token::{self, TokenRecord};

/// Token accessor over a credential store and an authorization server
pub struct TokenManager<C, S> {
    server: Arc<C>,
    store: Arc<S>,
    refresh_guard: Mutex<()>,
}

impl<C: AuthorizationServer, S: CredentialStore> TokenManager<C, S> {
    /// Create a manager over the given server and store
    #[must_use]
    pub fn new(server: Arc<C>, store: Arc<S>) -> Self {
        Self {
            server,
            store,
            refresh_guard: Mutex::new(()),
        }
    }

    /// Return a currently-valid access token
    ///
    /// Serves straight from the store with no network call while the stored
    /// token has remaining lifetime; otherwise performs a refresh.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoRefreshToken`] when a refresh is needed but no
    /// refresh token is stored (the caller must start a new login), or
    /// [`AuthError::RefreshFailed`] when the token endpoint rejects the
    /// refresh. Either way the previously stored fields are unchanged.
    pub async fn get_access_token(&self) -> AuthResult<String> {
        if let Some(record) = TokenRecord::load(self.store.as_ref())? {
            if record.is_fresh() {
                debug!("serving access token from storage");
                return Ok(record.access_token);
            }
        }

        self.refresh_access_token().await
    }

    /// Force a refresh through the token endpoint
    ///
    /// Access token and expiry are rewritten on success; the refresh token
    /// is preserved unless the provider issues a new one. Callers waiting on
    /// a refresh already in flight pick up its result instead of repeating
    /// the request.
    ///
    /// # Errors
    ///
    /// See [`Self::get_access_token`].
    pub async fn refresh_access_token(&self) -> AuthResult<String> {
        let _flight = self.refresh_guard.lock().await;

        // Another caller may have refreshed while we waited for the guard
        if let Some(record) = TokenRecord::load(self.store.as_ref())? {
            if record.is_fresh() {
                debug!("refresh already completed by concurrent caller");
                return Ok(record.access_token);
            }
        }

        let refresh_token = self
            .store
            .get(CredentialKey::RefreshToken)?
            .ok_or(AuthError::NoRefreshToken)?;

        let grant = self.server.refresh(&refresh_token).await?;
        let record = token::persist_grant(self.store.as_ref(), &grant)?;

        info!("access token refreshed");
        Ok(record.access_token)
    }

    /// Clear all stored credentials; idempotent
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself cannot be written.
    pub fn logout(&self) -> AuthResult<()> {
        self.store.clear()?;
        info!("credentials cleared");
        Ok(())
    }

    /// Whether any token record is stored (it may be expired)
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn is_authenticated(&self) -> AuthResult<bool> {
        Ok(TokenRecord::load(self.store.as_ref())?.is_some())
    }

    /// The stored token record without refreshing, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn current_token(&self) -> AuthResult<Option<TokenRecord>> {
        Ok(TokenRecord::load(self.store.as_ref())?)
    }
}
