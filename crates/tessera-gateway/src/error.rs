//! API error types and responses.
//!
//! This module defines the standard error format for all API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use tessera_auth::AuthError;
use tessera_login::LoginError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or rejected credentials.
    #[error("{message}")]
    Unauthorized {
        /// Stable failure label.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request conflicts with concurrent activity.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The identity provider failed.
    #[error("identity provider unavailable")]
    BadGateway,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// An unauthorized error for a request without a session cookie.
    #[must_use]
    pub fn no_session() -> Self {
        Self::Unauthorized {
            code: "no_session",
            message: "no session".to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { code, .. } => *code,
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Conflict(_) => "conflict",
            Self::BadGateway => "bad_gateway",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::MalformedToken
            | AuthError::VersionMismatch { .. }
            | AuthError::IssuerMismatch { .. } => {
                if err.needs_refresh() {
                    tracing::debug!("Session token expired");
                } else {
                    tracing::info!(code = err.code(), "Token rejected");
                }
                Self::Unauthorized {
                    code: err.code(),
                    message: err.to_string(),
                }
            }
            AuthError::KeyLoad(_) | AuthError::Signing(_) => {
                tracing::error!(error = %err, "Token internal error");
                Self::Internal("token service error".to_string())
            }
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::UnknownProvider(name) => Self::NotFound(format!("provider {name}")),
            LoginError::UserNotFound(_) => Self::Unauthorized {
                code: "user_not_found",
                message: "token valid, but user not found".to_string(),
            },
            LoginError::Auth(auth_err) => Self::from(auth_err),
            LoginError::Provider { provider, message } => {
                tracing::warn!(provider = %provider, error = %message, "Identity provider error");
                Self::BadGateway
            }
            LoginError::DuplicateAuthenticationRace { .. } => {
                Self::Conflict("login raced with another login, retry".to_string())
            }
            LoginError::StorageUnavailable(store_err) => {
                tracing::error!(error = %store_err, "Store error");
                Self::Internal("storage error".to_string())
            }
            LoginError::InvalidTransition { .. } | LoginError::Configuration(_) => {
                tracing::error!(error = %err, "Internal error");
                Self::Internal("internal error".to_string())
            }
        }
    }
}
