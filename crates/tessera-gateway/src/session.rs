//! Session cookie plumbing.
//!
//! The refresh token lives in an HTTP-only cookie. This module builds the
//! `Set-Cookie` values and provides the `SessionCookie` extractor.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use tessera_login::LoginOrchestrator;

use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::state::GatewayState;

/// `SameSite` policy of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SameSite {
    Strict,
    Lax,
}

fn build_cookie(
    config: &GatewayConfig,
    name: &str,
    value: &str,
    max_age: i64,
    same_site: SameSite,
) -> String {
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly");
    cookie.push_str(match same_site {
        SameSite::Strict => "; SameSite=Strict",
        SameSite::Lax => "; SameSite=Lax",
    });
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &config.cookie_domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie
}

fn max_age(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}

/// The `Set-Cookie` value carrying a refresh token.
#[must_use]
pub fn session_cookie(config: &GatewayConfig, token: &str) -> String {
    build_cookie(
        config,
        &config.cookie_name,
        token,
        max_age(config.session_cookie_max_age_seconds),
        SameSite::Strict,
    )
}

/// The `Set-Cookie` value removing the session cookie.
#[must_use]
pub fn clear_session_cookie(config: &GatewayConfig) -> String {
    build_cookie(config, &config.cookie_name, "", 0, SameSite::Strict)
}

/// The `Set-Cookie` value carrying the login state.
///
/// The provider callback is a cross-site navigation, so this cookie uses
/// `SameSite=Lax` to be sent back with it.
#[must_use]
pub fn state_cookie(config: &GatewayConfig, state: &str) -> String {
    build_cookie(
        config,
        &config.state_cookie_name(),
        state,
        max_age(config.state_cookie_max_age_seconds),
        SameSite::Lax,
    )
}

/// The `Set-Cookie` value removing the login state cookie.
#[must_use]
pub fn clear_state_cookie(config: &GatewayConfig) -> String {
    build_cookie(config, &config.state_cookie_name(), "", 0, SameSite::Lax)
}

/// Read a cookie value from request headers.
///
/// Empty values are treated as absent.
#[must_use]
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// The refresh token presented in the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie(pub String);

#[async_trait]
impl<L> FromRequestParts<Arc<GatewayState<L>>> for SessionCookie
where
    L: LoginOrchestrator + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState<L>>,
    ) -> Result<Self, Self::Rejection> {
        read_cookie(&parts.headers, &state.config.cookie_name)
            .map(SessionCookie)
            .ok_or_else(ApiError::no_session)
    }
}
