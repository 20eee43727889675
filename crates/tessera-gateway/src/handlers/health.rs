//! Health endpoint for load balancers.
//!
//! The gateway is ready while at least one identity provider is loaded.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use tessera_login::LoginOrchestrator;

use crate::state::GatewayState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ready` or `degraded`.
    pub status: &'static str,
    /// Crate version of the running binary.
    pub version: &'static str,
    /// Number of identity providers available for login.
    pub providers: usize,
}

/// `GET /health`
///
/// Answers `503` with status `degraded` when no provider is configured.
pub async fn health<L>(State(state): State<Arc<GatewayState<L>>>) -> (StatusCode, Json<HealthReport>)
where
    L: LoginOrchestrator + 'static,
{
    let providers = state.login.providers().len();
    let (code, status) = if providers == 0 {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    } else {
        (StatusCode::OK, "ready")
    };

    (
        code,
        Json(HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION"),
            providers,
        }),
    )
}
