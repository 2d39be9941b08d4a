//! PKCE (RFC 7636) verifier and challenge generation
//!
//! The verifier is a high-entropy random secret kept on the client; the
//! challenge is its SHA-256 hash, base64url-encoded without padding. Both
//! functions are pure apart from the random source.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Default verifier length in random bytes (86 base64url characters).
///
/// RFC 7636 requires 43-128 characters; 64 bytes encodes well within that.
pub const DEFAULT_VERIFIER_BYTES: usize = 64;

/// Generate a cryptographically random code verifier from `len` bytes,
/// base64url-encoded without padding.
#[must_use]
pub fn generate_verifier(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derive the code challenge: `BASE64URL(SHA256(ASCII(verifier)))`.
///
/// Deterministic - the same verifier always yields the same challenge.
#[must_use]
pub fn derive_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// A PKCE verifier/challenge pair for one authorization attempt
///
/// The verifier is kept secret until the token exchange; the challenge is
/// placed in the authorization URL and then discarded.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Random secret, sent as `code_verifier` during token exchange
    pub verifier: String,
    /// SHA-256 hash of the verifier, sent as `code_challenge`
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a new pair with the default verifier length
    #[must_use]
    pub fn generate() -> Self {
        Self::with_length(DEFAULT_VERIFIER_BYTES)
    }

    /// Generate a new pair from `bytes` random bytes
    #[must_use]
    pub fn with_length(bytes: usize) -> Self {
        let verifier = generate_verifier(bytes);
        let challenge = derive_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// The challenge method sent to the provider (always "S256")
    #[must_use]
    pub fn method(&self) -> &'static str {
        "S256"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_base64url(s: &str) -> bool {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn test_verifier_uses_base64url_alphabet() {
        // No `+`, `/`, or `=` for any length
        for len in [16, 32, 43, 64, 96, 128] {
            let verifier = generate_verifier(len);
            assert!(
                is_base64url(&verifier),
                "verifier for {len} bytes contains non-base64url characters: {verifier}"
            );
        }
    }

    #[test]
    fn test_default_verifier_length() {
        // 64 bytes -> ceil(64 * 4 / 3) = 86 chars without padding
        let verifier = generate_verifier(DEFAULT_VERIFIER_BYTES);
        assert_eq!(verifier.len(), 86);
    }

    #[test]
    fn test_challenge_is_deterministic() {
        let verifier = generate_verifier(64);
        assert_eq!(derive_challenge(&verifier), derive_challenge(&verifier));
    }

    #[test]
    fn test_challenge_changes_with_verifier() {
        // One-byte difference must produce a different challenge
        let a = derive_challenge("abcdefghijklmnopqrstuvwxyz0123456789abcdefg");
        let b = derive_challenge("abcdefghijklmnopqrstuvwxyz0123456789abcdefh");
        assert_ne!(a, b);
    }

    #[test]
    fn test_challenge_is_43_chars() {
        // SHA-256 digest is 32 bytes -> 43 base64url chars
        let challenge = derive_challenge(&generate_verifier(64));
        assert_eq!(challenge.len(), 43);
        assert!(is_base64url(&challenge));
    }

    #[test]
    fn test_generated_pairs_are_unique() {
        let a = PkceChallenge::generate();
        let b = PkceChallenge::generate();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.challenge, b.challenge);
        assert_eq!(a.challenge, derive_challenge(&a.verifier));
    }

    #[test]
    fn test_challenge_method() {
        assert_eq!(PkceChallenge::generate().method(), "S256");
    }
}
