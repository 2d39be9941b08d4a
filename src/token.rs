//! Durable token state and expiry bookkeeping
//!
//! A [`TokenRecord`] is the crate's only long-lived entity. It is written by
//! the callback processor after a successful code exchange and rewritten by
//! the token accessor on refresh; the stored expiry always has a safety
//! margin subtracted so a token reported valid here still has real remaining
//! lifetime at the provider.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::client::TokenGrant;
use crate::store::{CredentialKey, CredentialStore, StoreError};

/// Safety margin (seconds) subtracted from provider-reported lifetimes
pub const EXPIRY_MARGIN_SECS: u64 = 10;

/// Current unix timestamp in seconds
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// The durable credential state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Bearer access token for API calls
    pub access_token: String,

    /// Refresh token, absent until the provider issues one
    pub refresh_token: Option<String>,

    /// Absolute unix timestamp (seconds) at which the access token is
    /// considered expired, margin already applied
    pub expires_at: u64,
}

impl TokenRecord {
    /// Whether the access token still has remaining lifetime
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        unix_now() < self.expires_at
    }

    /// The `Authorization` header value for API requests
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Read the record from the credential store
    ///
    /// Returns `None` when no access token is stored (logged out). A missing
    /// or unparseable expiry reads as already expired rather than failing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store itself cannot be read.
    pub fn load<S: CredentialStore + ?Sized>(store: &S) -> Result<Option<Self>, StoreError> {
        let Some(access_token) = store.get(CredentialKey::AccessToken)? else {
            return Ok(None);
        };
        let refresh_token = store.get(CredentialKey::RefreshToken)?;
        let expires_at = store
            .get(CredentialKey::ExpiresAt)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Ok(Some(Self {
            access_token,
            refresh_token,
            expires_at,
        }))
    }
}

/// Convert a provider-reported lifetime into an absolute expiry with margin
///
/// Saturating in both directions: a lifetime shorter than the margin clamps
/// to "now", and an absurdly large lifetime clamps to `u64::MAX` instead of
/// overflowing.
pub(crate) fn expiry_from_lifetime(expires_in: u64) -> u64 {
    unix_now()
        .saturating_add(expires_in)
        .saturating_sub(EXPIRY_MARGIN_SECS)
}

/// Persist a token grant, returning the resulting record
///
/// Writes the access token and expiry unconditionally; the refresh token is
/// only overwritten when the grant carries one, preserving a previously
/// stored refresh token across refresh responses that omit it.
pub(crate) fn persist_grant<S: CredentialStore + ?Sized>(
    store: &S,
    grant: &TokenGrant,
) -> Result<TokenRecord, StoreError> {
    let expires_at = expiry_from_lifetime(grant.expires_in);

    store.set(CredentialKey::AccessToken, &grant.access_token)?;
    store.set(CredentialKey::ExpiresAt, &expires_at.to_string())?;
    if let Some(refresh) = &grant.refresh_token {
        store.set(CredentialKey::RefreshToken, refresh)?;
    }

    let refresh_token = match &grant.refresh_token {
        Some(refresh) => Some(refresh.clone()),
        None => store.get(CredentialKey::RefreshToken)?,
    };

    Ok(TokenRecord {
        access_token: grant.access_token.clone(),
        refresh_token,
        expires_at,
    })
}
