//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use tessera_login::LoginOrchestrator;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
pub struct GatewayState<L>
where
    L: LoginOrchestrator,
{
    /// The login service.
    pub login: Arc<L>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<L> GatewayState<L>
where
    L: LoginOrchestrator,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(login: Arc<L>, config: GatewayConfig) -> Self {
        Self { login, config }
    }
}

impl<L> Clone for GatewayState<L>
where
    L: LoginOrchestrator,
{
    fn clone(&self) -> Self {
        Self {
            login: Arc::clone(&self.login),
            config: self.config.clone(),
        }
    }
}
