//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use tessera_login::LoginOrchestrator;

use crate::handlers::{auth, health, tokens};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `GET /providers` - Configured identity providers
/// - `GET /auth/begin/:provider` - Redirect to the provider
/// - `GET /auth/end/:provider` - Provider callback, sets the session cookie
/// - `GET /auth/logout` - Clear the session cookie
/// - `GET /token` - Access token from the session cookie
/// - `GET /validate` - Check an access token
pub fn create_router<L>(state: GatewayState<L>) -> Router
where
    L: LoginOrchestrator + 'static,
{
    let cors = build_cors_layer(&state.config.cors_origins);
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes))
        .layer(TimeoutLayer::new(state.config.request_timeout()));

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health::<L>))
        .route("/providers", get(auth::list_providers::<L>))
        .route("/auth/begin/:provider", get(auth::begin_login::<L>))
        .route("/auth/end/:provider", get(auth::complete_login::<L>))
        .route("/auth/logout", get(auth::logout::<L>))
        .route("/token", get(tokens::issue_token::<L>))
        .route("/validate", get(tokens::validate_token::<L>))
        .layer(middleware)
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// Specific origins may send the session cookie. A wildcard may not, since
/// browsers reject credentials with `Access-Control-Allow-Origin: *`.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true)
    }
}
