//! Token signing, verification and rotation for tessera.
//!
//! This crate turns a resolved user into a pair of signed tokens and checks
//! those tokens when they come back:
//!
//! - **Key material**: HMAC-SHA512 secrets or RSA-SHA512 PEM key pairs,
//!   chosen once at startup
//! - **Claims**: the refresh and access claim layouts and their parsing
//! - **Tokens**: issuing, ordered verification and the rotation policy
//! - **Client**: offline access-token checks for downstream services
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │  LoginService    │────▶│  TokenService    │
//! │  (login crate)   │     │                  │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                 ┌─────────────────┼─────────────────┐
//!                 ▼                                   ▼
//!        ┌──────────────────┐               ┌──────────────────┐
//!        │  ClaimsCodec     │               │  KeyMaterial     │
//!        │  (claim layout)  │               │  (HS512 / RS512) │
//!        └──────────────────┘               └──────────────────┘
//! ```
//!
//! Downstream services use a [`ServiceClient`], which wraps a `TokenService`
//! over verification-only key material and never touches storage.
//!
//! # Example
//!
//! ```no_run
//! use tessera_auth::{keys, KeyConfig, TokenConfig, TokenService};
//!
//! # fn example(user: &tessera_store::User) -> Result<(), Box<dyn std::error::Error>> {
//! let keys = keys::load(&KeyConfig::Secret { secret: "change-me".to_string() })?;
//! let tokens = TokenService::new(TokenConfig::default(), keys);
//!
//! let refresh = tokens.issue_refresh_token(user)?;
//! let claims = tokens.verify_refresh_token(&refresh)?;
//! assert_eq!(claims.subject, user.id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod claims;
pub mod client;
pub mod error;
pub mod keys;
pub mod tokens;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub use claims::{ClaimsCodec, TokenClaims, TokenKind, PROTOCOL_VERSION};
pub use client::ServiceClient;
pub use error::{AuthError, ClientError, KeyLoadError, Result};
pub use keys::{KeyMaterial, RsaKeyPair, SymmetricKey};
pub use tokens::{IssuedAccessToken, TokenService};

/// Token lifetimes and identity of the issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// The `iss` claim stamped on every token.
    #[serde(default = "TokenConfig::default_issuer")]
    pub issuer: String,

    /// Audience used when the user's public data has no `aud` string.
    #[serde(default = "TokenConfig::default_audience")]
    pub default_audience: String,

    /// Refresh token lifetime in seconds.
    #[serde(default = "TokenConfig::default_refresh_ttl")]
    pub refresh_token_ttl_seconds: u64,

    /// Access token lifetime in seconds.
    #[serde(default = "TokenConfig::default_access_ttl")]
    pub access_token_ttl_seconds: u64,

    /// A refresh token older than this is replaced on use.
    #[serde(default = "TokenConfig::default_min_age_for_refresh")]
    pub min_age_for_refresh_seconds: u64,
}

impl TokenConfig {
    fn default_issuer() -> String {
        "tessera".to_string()
    }

    fn default_audience() -> String {
        "tessera".to_string()
    }

    const fn default_refresh_ttl() -> u64 {
        86_400 // 24 hours
    }

    const fn default_access_ttl() -> u64 {
        90
    }

    const fn default_min_age_for_refresh() -> u64 {
        3_600
    }

    /// Get the refresh token lifetime as a `Duration`.
    #[must_use]
    pub const fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_seconds)
    }

    /// Get the access token lifetime as a `Duration`.
    #[must_use]
    pub const fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_seconds)
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: Self::default_issuer(),
            default_audience: Self::default_audience(),
            refresh_token_ttl_seconds: Self::default_refresh_ttl(),
            access_token_ttl_seconds: Self::default_access_ttl(),
            min_age_for_refresh_seconds: Self::default_min_age_for_refresh(),
        }
    }
}

/// Where signing keys come from.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyConfig {
    /// HMAC-SHA512 with a shared secret.
    Secret {
        /// The shared secret.
        secret: String,
    },
    /// RSA-SHA512 with PEM files.
    Rsa {
        /// PKCS#1 or PKCS#8 private key. Without it the key only verifies.
        #[serde(default)]
        private_key_path: Option<PathBuf>,
        /// PKIX public key.
        public_key_path: PathBuf,
    },
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret { .. } => f.debug_struct("Secret").finish_non_exhaustive(),
            Self::Rsa {
                private_key_path,
                public_key_path,
            } => f
                .debug_struct("Rsa")
                .field("private_key_path", private_key_path)
                .field("public_key_path", public_key_path)
                .finish(),
        }
    }
}
