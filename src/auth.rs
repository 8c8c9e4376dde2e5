//! Stateless token authority: issues and verifies signed, time-bound tokens.
//!
//! # Design
//!
//! Tokens are HMAC-SHA256 signed (HS256) over a `{iat, exp}` claim set with
//! a symmetric secret. Validity is entirely self-contained in the credential
//! plus the shared secret: the server keeps no per-session state and there is
//! no revocation list — tokens simply expire.
//!
//! Signature verification inside `jsonwebtoken` uses a constant-time
//! comparison, so the authority is not vulnerable to timing side-channels on
//! the signature check.
//!
//! # Expiry
//!
//! Tokens are short-lived; the TTL is injected at construction. Verification
//! runs with zero leeway so a token is rejected the moment its `exp` passes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors produced while issuing or verifying tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token could not be produced (empty secret or encoder failure).
    #[error("token signing failed: {0}")]
    Signing(String),

    /// The signature does not match the configured secret.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The token was valid once but its expiry has passed.
    #[error("token has expired")]
    Expired,

    /// The credential cannot be parsed as a token at all.
    #[error("token is malformed")]
    Malformed,
}

/// Claim set carried by an access token.
///
/// Deliberately subject-less: the gateway authenticates bearers, not users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Issues and verifies access tokens against a symmetric secret.
///
/// The secret and TTL are read-only after construction, so the authority is
/// freely clonable and shareable across concurrent requests without locking.
#[derive(Clone)]
pub struct TokenAuthority {
    secret: Arc<String>,
    ttl: Duration,
}

impl TokenAuthority {
    /// Create a new authority with the given signing secret and token TTL.
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            ttl,
        }
    }

    /// Issue a freshly signed token expiring `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the configured secret is empty or the
    /// encoder fails.
    pub fn issue(&self) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::Signing("signing secret is empty".to_string()));
        }

        // Saturate rather than wrap: an absurdly large TTL must not produce
        // a negative (instantly expired) expiry.
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            iat: now,
            exp: now.saturating_add(ttl),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// # Errors
    ///
    /// - `AuthError::Expired` if the expiry has passed
    /// - `AuthError::InvalidSignature` if the signature does not match
    /// - `AuthError::Malformed` if the credential cannot be parsed
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::Malformed,
                }
            })
    }

    /// The configured token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
