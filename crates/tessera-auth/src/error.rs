//! Token error types.

use std::path::PathBuf;

use thiserror::Error;

use tessera_core::IdError;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while loading key material at startup.
#[derive(Debug, Error)]
pub enum KeyLoadError {
    /// A key file could not be read.
    #[error("failed to read key file {path}: {source}")]
    Unreadable {
        /// Path of the key file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file does not contain a PEM block.
    #[error("no PEM block found in {0}")]
    MissingPemBlock(PathBuf),

    /// The PEM block does not hold an RSA key.
    #[error("not an RSA key: {0}")]
    NotRsa(String),

    /// The symmetric secret is empty.
    #[error("symmetric secret must not be empty")]
    EmptySecret,

    /// The private key does not match the public key.
    #[error("private key does not match public key")]
    KeyPairMismatch,
}

/// Errors that can occur while issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Key material could not be loaded.
    #[error("key load failed: {0}")]
    KeyLoad(#[from] KeyLoadError),

    /// The token signature does not verify under the configured key.
    #[error("invalid signature")]
    InvalidSignature,

    /// The token has expired.
    #[error("token expired")]
    TokenExpired,

    /// The token is not a well-formed token of the expected kind.
    #[error("malformed token")]
    MalformedToken,

    /// The token was issued under a different protocol version.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The version this build issues.
        expected: String,
        /// The version found in the token.
        actual: String,
    },

    /// The refresh token was issued by someone else.
    #[error("issuer mismatch: expected {expected}, got {actual}")]
    IssuerMismatch {
        /// The configured issuer.
        expected: String,
        /// The issuer found in the token.
        actual: String,
    },

    /// Signing a token failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// Errors raised by [`crate::client::ServiceClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL has no `http://` or `https://` scheme.
    #[error("base URL must start with http:// or https://, got {0}")]
    InvalidBaseUrl(String),

    /// The public key could not be loaded.
    #[error("public key: {0}")]
    KeyLoad(#[from] KeyLoadError),

    /// The HTTP request failed or the body could not be decoded.
    #[error("request failed: {0}")]
    Request(String),

    /// The login service answered with a non-success status.
    #[error("login service answered HTTP {0}")]
    Status(u16),
}

impl AuthError {
    /// Stable label for this error, safe to show to clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KeyLoad(_) => "key_load_failed",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::MalformedToken => "malformed_token",
            Self::VersionMismatch { .. } => "version_mismatch",
            Self::IssuerMismatch { .. } => "issuer_mismatch",
            Self::Signing(_) => "signing_failed",
        }
    }

    /// Returns `true` if the token was sound but has run out, so the holder
    /// should obtain a fresh one. Presenting the same token again never helps.
    #[must_use]
    pub const fn needs_refresh(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidSignature
            | Self::TokenExpired
            | Self::MalformedToken
            | Self::VersionMismatch { .. }
            | Self::IssuerMismatch { .. } => 401,
            Self::KeyLoad(_) | Self::Signing(_) => 500,
        }
    }
}

impl From<IdError> for AuthError {
    fn from(_: IdError) -> Self {
        Self::MalformedToken
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => {
                tracing::debug!(error = %err, "Token could not be parsed");
                Self::MalformedToken
            }
        }
    }
}
