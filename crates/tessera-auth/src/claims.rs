//! Token claim sets.
//!
//! Two token kinds share one claim layout. Refresh tokens carry
//! `{sub, iss, iat, exp, ver}`; access tokens add `aud` and `public-data`.
//! Timestamps are seconds since the Unix epoch and `sub` is the decimal
//! form of the user id.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tessera_core::{UserData, UserId};

use crate::error::{AuthError, Result};
use crate::keys::RawClaims;

/// The protocol version stamped into every token this build issues.
pub const PROTOCOL_VERSION: &str = "tessera/1";

/// Claim names as they appear on the wire.
pub mod names {
    /// Subject: the decimal user id.
    pub const SUBJECT: &str = "sub";
    /// Issuer.
    pub const ISSUER: &str = "iss";
    /// Expiry, seconds since the epoch.
    pub const EXPIRES_AT: &str = "exp";
    /// Issue time, seconds since the epoch.
    pub const ISSUED_AT: &str = "iat";
    /// Audience (access tokens only).
    pub const AUDIENCE: &str = "aud";
    /// Protocol version.
    pub const VERSION: &str = "ver";
    /// The user's public data document (access tokens only).
    pub const PUBLIC_DATA: &str = "public-data";
}

/// The kind of a decoded claim set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Long-lived session credential.
    Refresh,
    /// Short-lived credential presented to downstream services.
    Access,
}

/// A decoded or freshly built claim set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenClaims {
    /// The user the token was issued to.
    #[serde(rename = "sub")]
    pub subject: UserId,
    /// Who issued the token.
    #[serde(rename = "iss")]
    pub issuer: String,
    /// Expiry in seconds since the epoch.
    #[serde(rename = "exp")]
    pub expires_at: i64,
    /// Issue time in seconds since the epoch.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Intended audience. Present on access tokens only.
    #[serde(rename = "aud", skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    /// Protocol version. Non-string values are rendered as JSON text so the
    /// mismatch can be reported.
    #[serde(rename = "ver")]
    pub version: String,
    /// The user's public data. Present on access tokens only.
    #[serde(rename = "public-data", skip_serializing_if = "Option::is_none")]
    pub public_data: Option<UserData>,
}

/// The wire form before validation of individual fields.
#[derive(Deserialize)]
struct WireClaims {
    sub: String,
    iss: String,
    exp: i64,
    iat: i64,
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    ver: Value,
    #[serde(rename = "public-data", default)]
    public_data: Option<UserData>,
}

impl TokenClaims {
    /// Which kind of token this claim set belongs to.
    ///
    /// Any access-only claim (`aud` or `public-data`) makes it an access
    /// claim set.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        if self.audience.is_some() || self.public_data.is_some() {
            TokenKind::Access
        } else {
            TokenKind::Refresh
        }
    }

    /// Returns true if the version matches [`PROTOCOL_VERSION`].
    #[must_use]
    pub fn has_current_version(&self) -> bool {
        self.version == PROTOCOL_VERSION
    }

    /// Render the claim set as a raw JSON object for signing.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the claims cannot be serialized.
    pub fn to_raw(&self) -> Result<RawClaims> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AuthError::Signing("claims are not an object".to_string())),
            Err(e) => Err(AuthError::Signing(e.to_string())),
        }
    }
}

/// Builds and parses claim sets.
pub struct ClaimsCodec;

impl ClaimsCodec {
    /// Build refresh claims expiring `ttl` from now.
    #[must_use]
    pub fn encode_refresh(user_id: UserId, issuer: &str, ttl: Duration) -> TokenClaims {
        let (issued_at, expires_at) = Self::window(ttl);
        TokenClaims {
            subject: user_id,
            issuer: issuer.to_string(),
            expires_at,
            issued_at,
            audience: None,
            version: PROTOCOL_VERSION.to_string(),
            public_data: None,
        }
    }

    /// Build access claims expiring `ttl` from now.
    #[must_use]
    pub fn encode_access(
        user_id: UserId,
        audience: &str,
        issuer: &str,
        ttl: Duration,
        public_data: &UserData,
    ) -> TokenClaims {
        let (issued_at, expires_at) = Self::window(ttl);
        TokenClaims {
            subject: user_id,
            issuer: issuer.to_string(),
            expires_at,
            issued_at,
            audience: Some(audience.to_string()),
            version: PROTOCOL_VERSION.to_string(),
            public_data: Some(public_data.clone()),
        }
    }

    /// Parse raw claims without regard to token kind.
    ///
    /// The version is not checked here.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MalformedToken` if a required claim is missing or
    /// has the wrong type, or if the subject is not a valid user id.
    pub fn decode(raw: RawClaims) -> Result<TokenClaims> {
        let wire: WireClaims = serde_json::from_value(Value::Object(raw)).map_err(|e| {
            tracing::debug!(error = %e, "Claims did not match the expected layout");
            AuthError::MalformedToken
        })?;

        let subject = UserId::from_subject(&wire.sub)?;
        let version = match wire.ver {
            Value::String(version) => version,
            other => other.to_string(),
        };

        Ok(TokenClaims {
            subject,
            issuer: wire.iss,
            expires_at: wire.exp,
            issued_at: wire.iat,
            audience: wire.aud,
            version,
            public_data: wire.public_data,
        })
    }

    fn window(ttl: Duration) -> (i64, i64) {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        (now, now.saturating_add(ttl))
    }
}
