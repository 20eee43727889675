//! Request and response types for login operations.

use serde::Serialize;

use tessera_auth::TokenClaims;
use tessera_store::{Authentication, User};

/// The identity a provider vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// Provider-scoped stable identifier.
    pub subject: String,
    /// Email reported by the provider, if any.
    pub email: Option<String>,
}

/// A user resolved from an external identity.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    /// The owning local user.
    pub user: User,
    /// The authentication record matching the identity.
    pub authentication: Authentication,
    /// True if the user was created by this resolution.
    pub is_new_user: bool,
}

/// Where to send the browser to start a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginStart {
    /// Provider authorization URL.
    pub redirect_url: String,
    /// Opaque value the provider echoes back on the callback.
    pub state: String,
}

/// The result of a completed provider callback.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The session credential.
    pub refresh_token: String,
    /// The logged-in user.
    pub user: User,
    /// True if this login created the user.
    pub is_new_user: bool,
}

/// A freshly minted access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGrant {
    /// The access token.
    pub access_token: String,
    /// Expiry in seconds since the epoch.
    pub expires_at: i64,
    /// A replacement refresh token, present when the old one was due.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotated_refresh_token: Option<String>,
    /// The first email among the user's authentications.
    pub email: Option<String>,
}

/// Outcome of checking an access token for a downstream service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Whether the token verified.
    pub valid: bool,
    /// Verified claims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<TokenClaims>,
    /// Failure label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl ValidationReport {
    /// A report for a verified token.
    #[must_use]
    pub const fn valid(claims: TokenClaims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    /// A report for a rejected token.
    #[must_use]
    pub const fn invalid(error: &'static str) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(error),
        }
    }
}
