//! Token issuing, verification and rotation.
//!
//! `TokenService` owns no persistent state. It reads users handed to it by
//! the caller and consults nothing but the key material and the clock.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use tessera_store::User;

use crate::claims::{ClaimsCodec, TokenClaims, TokenKind, PROTOCOL_VERSION};
use crate::error::{AuthError, Result};
use crate::keys::KeyMaterial;
use crate::TokenConfig;

/// An access token together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAccessToken {
    /// The signed token.
    pub token: String,
    /// Expiry in seconds since the epoch.
    pub expires_at: i64,
}

/// Issues and verifies refresh and access tokens.
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    keys: Arc<dyn KeyMaterial>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.config.issuer)
            .field("keys", &self.keys)
            .finish()
    }
}

impl TokenService {
    /// Create a token service over the given key material.
    #[must_use]
    pub fn new(config: TokenConfig, keys: Arc<dyn KeyMaterial>) -> Self {
        Self { config, keys }
    }

    /// The token configuration.
    #[must_use]
    pub const fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a refresh token for the user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the key material cannot sign.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String> {
        let claims =
            ClaimsCodec::encode_refresh(user.id, &self.config.issuer, self.config.refresh_token_ttl());
        self.keys.sign(&claims.to_raw()?)
    }

    /// Issue an access token for the user.
    ///
    /// The audience is the user's public `aud` entry when it is a string and
    /// the configured default otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the key material cannot sign.
    pub fn issue_access_token(&self, user: &User) -> Result<IssuedAccessToken> {
        let audience = user
            .public_data
            .get_str("aud")
            .unwrap_or(&self.config.default_audience);

        let claims = ClaimsCodec::encode_access(
            user.id,
            audience,
            &self.config.issuer,
            self.config.access_token_ttl(),
            &user.public_data,
        );
        let token = self.keys.sign(&claims.to_raw()?)?;

        Ok(IssuedAccessToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    /// Verify a refresh token.
    ///
    /// Checks run in order and stop at the first failure: signature,
    /// expiry, structure, version, issuer. A claim set carrying `aud` or
    /// `public-data` is an access token and is reported as malformed.
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` of the first failing check.
    pub fn verify_refresh_token(&self, token: &str) -> Result<TokenClaims> {
        let claims = self.verify_kind(token, TokenKind::Refresh)?;

        if claims.issuer != self.config.issuer {
            tracing::debug!(issuer = %claims.issuer, "Refresh token from foreign issuer");
            return Err(AuthError::IssuerMismatch {
                expected: self.config.issuer.clone(),
                actual: claims.issuer,
            });
        }

        Ok(claims)
    }

    /// Verify an access token.
    ///
    /// Same as refresh verification minus the issuer check. A token without
    /// an audience is not an access token and is reported as malformed.
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` of the first failing check.
    pub fn verify_access_token(&self, token: &str) -> Result<TokenClaims> {
        self.verify_kind(token, TokenKind::Access)
    }

    /// Returns true if the refresh token is old enough to be replaced.
    #[must_use]
    pub fn should_rotate(&self, claims: &TokenClaims) -> bool {
        self.should_rotate_at(claims, Utc::now().timestamp())
    }

    /// Like [`TokenService::should_rotate`] with an explicit clock reading.
    #[must_use]
    pub fn should_rotate_at(&self, claims: &TokenClaims, now: i64) -> bool {
        let age = now.saturating_sub(claims.issued_at);
        let min_age = i64::try_from(self.config.min_age_for_refresh_seconds).unwrap_or(i64::MAX);
        age > min_age
    }

    fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<TokenClaims> {
        let claims = ClaimsCodec::decode(self.keys.verify(token)?)?;

        let shaped = match expected {
            TokenKind::Refresh => claims.kind() == TokenKind::Refresh,
            TokenKind::Access => claims.audience.is_some(),
        };
        if !shaped {
            tracing::debug!(?expected, actual = ?claims.kind(), "Token of the wrong kind");
            return Err(AuthError::MalformedToken);
        }

        Self::check_version(claims)
    }

    fn check_version(claims: TokenClaims) -> Result<TokenClaims> {
        if claims.has_current_version() {
            Ok(claims)
        } else {
            tracing::debug!(version = %claims.version, "Token from another protocol version");
            Err(AuthError::VersionMismatch {
                expected: PROTOCOL_VERSION.to_string(),
                actual: claims.version,
            })
        }
    }
}
