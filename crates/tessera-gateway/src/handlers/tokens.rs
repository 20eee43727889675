//! Token endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use tessera_login::{LoginOrchestrator, ValidationReport};

use crate::error::ApiError;
use crate::session::{self, SessionCookie};
use crate::state::GatewayState;

/// Response carrying a fresh access token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// The access token.
    pub token: String,
    /// Expiry in seconds since the epoch.
    pub exp: i64,
    /// Primary email of the user.
    pub email: Option<String>,
}

/// Query parameters of `/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    /// The access token to check.
    pub token: Option<String>,
}

/// Mint an access token from the session cookie.
///
/// `GET /token`
///
/// When the refresh token is old enough it is replaced and the session
/// cookie is set again.
pub async fn issue_token<L>(
    State(state): State<Arc<GatewayState<L>>>,
    SessionCookie(refresh_token): SessionCookie,
) -> Result<Response, ApiError>
where
    L: LoginOrchestrator + 'static,
{
    let grant = state.login.refresh_access_token(&refresh_token).await?;

    let rotated = grant
        .rotated_refresh_token
        .as_deref()
        .map(|token| (SET_COOKIE, session::session_cookie(&state.config, token)));

    let body = TokenResponse {
        token: grant.access_token,
        exp: grant.expires_at,
        email: grant.email,
    };

    Ok((
        AppendHeaders([(CACHE_CONTROL, "no-store".to_string())]),
        AppendHeaders(rotated),
        Json(body),
    )
        .into_response())
}

/// Check an access token for a downstream service.
///
/// `GET /validate?token=`
///
/// Rejected tokens still answer `200 OK` with `valid: false`. Only a
/// missing token is a bad request.
pub async fn validate_token<L>(
    State(state): State<Arc<GatewayState<L>>>,
    Query(params): Query<ValidateParams>,
) -> Response
where
    L: LoginOrchestrator + 'static,
{
    match params.token.filter(|t| !t.is_empty()) {
        Some(token) => Json(state.login.validate_access_token(&token).await).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(ValidationReport::invalid("missing_token")),
        )
            .into_response(),
    }
}
