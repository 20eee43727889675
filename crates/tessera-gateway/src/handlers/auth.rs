//! Login endpoints.
//!
//! The browser is sent to the provider by `begin_login` and comes back to
//! `complete_login`, which sets the session cookie.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use tessera_core::UserId;
use tessera_login::lifecycle::is_terminal;
use tessera_login::LoginOrchestrator;

use crate::error::ApiError;
use crate::session;
use crate::state::GatewayState;

/// Response listing configured providers.
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Provider names.
    pub providers: Vec<String>,
}

/// Query parameters of the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// Echoed login state.
    pub state: Option<String>,
    /// Error reported by the provider instead of a code.
    pub error: Option<String>,
}

/// Response of a completed login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The logged-in user.
    pub user_id: UserId,
    /// True if this login created the user.
    pub is_new_user: bool,
}

/// Response of a logout.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Status message.
    pub message: &'static str,
}

/// List the configured providers.
///
/// `GET /providers`
pub async fn list_providers<L>(State(state): State<Arc<GatewayState<L>>>) -> Json<ProvidersResponse>
where
    L: LoginOrchestrator + 'static,
{
    Json(ProvidersResponse {
        providers: state.login.providers(),
    })
}

/// Redirect the browser to the provider.
///
/// `GET /auth/begin/:provider`
///
/// Answers `302 Found` and stores the login state in a short-lived cookie.
pub async fn begin_login<L>(
    State(state): State<Arc<GatewayState<L>>>,
    Path(provider): Path<String>,
) -> Result<Response, ApiError>
where
    L: LoginOrchestrator + 'static,
{
    let start = state.login.begin_login(&provider).await?;
    let cookie = session::state_cookie(&state.config, &start.state);

    Ok((
        StatusCode::FOUND,
        AppendHeaders([(LOCATION, start.redirect_url), (SET_COOKIE, cookie)]),
    )
        .into_response())
}

/// Handle the provider callback.
///
/// `GET /auth/end/:provider?code=&state=`
///
/// The `state` parameter must match the state cookie set by `begin_login`.
pub async fn complete_login<L>(
    State(state): State<Arc<GatewayState<L>>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    L: LoginOrchestrator + 'static,
{
    if let Some(error) = params.error {
        tracing::info!(provider = %provider, error = %error, "Provider refused login");
        return Err(ApiError::BadRequest(format!("provider returned {error}")));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing code".to_string()))?;

    let expected = session::read_cookie(&headers, &state.config.state_cookie_name());
    match (expected, params.state) {
        (Some(expected), Some(actual)) if expected == actual => {}
        _ => {
            tracing::warn!(provider = %provider, "Login state mismatch");
            return Err(ApiError::BadRequest("login state mismatch".to_string()));
        }
    }

    let outcome = state.login.complete_login(&provider, &code).await?;

    let body = LoginResponse {
        user_id: outcome.user.id,
        is_new_user: outcome.is_new_user,
    };

    Ok((
        AppendHeaders([
            (
                SET_COOKIE,
                session::session_cookie(&state.config, &outcome.refresh_token),
            ),
            (SET_COOKIE, session::clear_state_cookie(&state.config)),
            (CACHE_CONTROL, "no-store".to_string()),
        ]),
        Json(body),
    )
        .into_response())
}

/// Drop the session cookie.
///
/// `GET /auth/logout`
///
/// The cookie is cleared whatever state the flow ends in.
pub async fn logout<L>(State(state): State<Arc<GatewayState<L>>>) -> impl IntoResponse
where
    L: LoginOrchestrator + 'static,
{
    let ended = state.login.logout().await;
    if !is_terminal(ended) {
        tracing::warn!(state = ?ended, "Logout did not end the login flow");
    }

    (
        AppendHeaders([(SET_COOKIE, session::clear_session_cookie(&state.config))]),
        Json(LogoutResponse {
            message: "logged out",
        }),
    )
}
