//! Error types for login orchestration.
//!
//! This module defines all errors that can occur while resolving identities
//! and running the login flow.

use tessera_core::UserId;
use thiserror::Error;

use crate::lifecycle::LoginState;

/// A result type using `LoginError`.
pub type Result<T> = std::result::Result<T, LoginError>;

/// Errors that can occur in login operations.
#[derive(Debug, Error)]
pub enum LoginError {
    /// No provider with this name is configured.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The identity provider exchange failed.
    #[error("provider {provider} failed: {message}")]
    Provider {
        /// Name of the provider.
        provider: String,
        /// What went wrong.
        message: String,
    },

    /// A token verified but its user no longer exists.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Creation lost a uniqueness race and the winner could not be read back.
    #[error("authentication for {provider}/{subject} was created concurrently")]
    DuplicateAuthenticationRace {
        /// Name of the provider.
        provider: String,
        /// Provider-scoped subject.
        subject: String,
    },

    /// The requested flow transition is not valid.
    #[error("invalid login transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// The current state.
        from: LoginState,
        /// The requested state.
        to: LoginState,
    },

    /// The service is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Storage layer error.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] tessera_store::StoreError),

    /// Token error.
    #[error("token error: {0}")]
    Auth(#[from] tessera_auth::AuthError),
}

impl LoginError {
    /// Build a provider error.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl ToString) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::UnknownProvider(_) => 404,
            Self::Provider { .. } => 502,
            Self::UserNotFound(_) => 401,
            Self::Auth(err) => err.http_status_code(),
            Self::DuplicateAuthenticationRace { .. } => 409,
            Self::InvalidTransition { .. }
            | Self::Configuration(_)
            | Self::StorageUnavailable(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_) | Self::Provider { .. } | Self::DuplicateAuthenticationRace { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_auth::AuthError;

    #[test]
    fn error_status_codes() {
        assert_eq!(LoginError::UnknownProvider("x".into()).http_status_code(), 404);
        assert_eq!(LoginError::provider("github", "timeout").http_status_code(), 502);
        assert_eq!(LoginError::UserNotFound(UserId::new(1)).http_status_code(), 401);
        assert_eq!(LoginError::Auth(AuthError::TokenExpired).http_status_code(), 401);
        assert_eq!(
            LoginError::StorageUnavailable(tessera_store::StoreError::NotFound).http_status_code(),
            500
        );
    }

    #[test]
    fn retriable() {
        assert!(LoginError::provider("github", "timeout").is_retriable());
        assert!(!LoginError::UnknownProvider("x".into()).is_retriable());
        assert!(!LoginError::Auth(AuthError::InvalidSignature).is_retriable());
        assert!(!LoginError::Auth(AuthError::TokenExpired).is_retriable());
    }
}
