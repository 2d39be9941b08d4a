//! # Spotify OAuth 2.0 + PKCE token lifecycle
//!
//! Token lifecycle manager for dashboard-style Spotify clients, implementing
//! the Authorization Code flow with PKCE (Proof Key for Code Exchange).
//! Async/await, strong typing, tokio-based.
//!
//! # Overview
//!
//! The flow works as follows:
//!
//! 1. Generate a code verifier and challenge (PKCE)
//! 2. Persist the verifier and redirect the browser to the authorization URL
//! 3. The provider redirects back with an authorization code
//! 4. Exchange code + verifier for an access/refresh token pair
//! 5. Serve the stored token to API callers, refreshing it on expiry
//!
//! The crate deliberately stops at the bearer token: playback endpoints, UI,
//! and offline caching are collaborators that call
//! [`TokenManager::get_access_token`] and are otherwise out of scope.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use spotify_pkce::{
//!     CallbackParams, FileStore, LoginFlow, OAuthClient, OAuthConfig, TokenManager,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OAuthConfig::new("your-client-id", "https://example.com/callback.html");
//!     let server = Arc::new(OAuthClient::new(config));
//!     let store = Arc::new(FileStore::new());
//!
//!     // Dashboard start: begin a login when no credentials are stored
//!     let flow = LoginFlow::new(server.clone(), store.clone());
//!     flow.begin_login()?;
//!
//!     // Callback page: exchange the code for tokens
//!     let params = CallbackParams::from_query("code=AQB...");
//!     flow.process_callback(&params).await?;
//!
//!     // API calls: always go through the manager
//!     let manager = TokenManager::new(server, store);
//!     let token = manager.get_access_token().await?;
//!     println!("Bearer {token}");
//!     Ok(())
//! }
//! ```
//!
//! # Ordering contract
//!
//! [`LoginFlow::process_callback`] must complete before
//! [`TokenManager::get_access_token`] is expected to observe the resulting
//! record. In a browser-style client this holds naturally because the
//! callback runs on its own page load; embedders driving both from one
//! process must sequence the two calls themselves.
//!
//! # Security
//!
//! - PKCE prevents authorization code interception attacks
//! - Credentials are stored with user-only permissions (600) by [`FileStore`]
//! - The stored expiry carries a 10-second safety margin, so a token served
//!   from storage still has real remaining lifetime at the provider
//! - Token and verifier values are never logged
//!
//! # Error handling
//!
//! Every failure surfaces synchronously as an [`AuthError`]; the crate never
//! retries on its own, and a failed exchange or refresh leaves the stored
//! credentials exactly as they were.

pub mod client;
pub mod error;
pub mod flow;
pub mod manager;
pub mod pkce;
pub mod store;
pub mod token;

pub use client::{AuthorizationServer, OAuthClient, OAuthConfig, TokenGrant};
pub use error::{AuthError, AuthResult};
pub use flow::{CallbackParams, LoginFlow, Navigator, SystemBrowser};
pub use manager::TokenManager;
pub use pkce::PkceChallenge;
pub use store::{CredentialKey, CredentialStore, FileStore, MemoryStore, StoreError};
pub use token::{EXPIRY_MARGIN_SECS, TokenRecord};
