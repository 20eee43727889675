//! Tessera Gateway - federated login service
//!
//! This is the main entry point for the login service.
//!
//! # Configuration
//!
//! Settings are read from the JSON file named by `CONFIG_PATH` (default
//! `tessera.json`). `LISTEN_ADDR` and `DATA_DIR` override the file.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` to replace OIDC discovery with mock
//! providers that need no network access. Each configured provider name gets
//! a mock; complete a login with `code=mock-code:<subject>[:<email>]`.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tessera_auth::{keys, TokenService};
#[cfg(feature = "dev-mode")]
use tessera_login::{IdentityProvider, MockIdentityProvider};
use tessera_login::{LoginService, ProviderRegistry};
use tessera_gateway::{create_router, GatewayState, ServiceConfig};
use tessera_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tessera=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tessera Gateway");

    let config = ServiceConfig::load()?;
    tracing::info!(
        listen_addr = %config.gateway.listen_addr,
        public_url = %config.gateway.public_url,
        data_dir = %config.data_dir,
        issuer = %config.tokens.issuer,
        providers = config.providers.len(),
        "Configuration loaded"
    );

    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    let key_material = keys::load(&config.keys)?;
    tracing::info!(algorithm = ?key_material.algorithm(), "Signing keys loaded");
    let tokens = TokenService::new(config.tokens.clone(), key_material);

    #[cfg(feature = "dev-mode")]
    let registry = {
        tracing::warn!("DEV MODE ENABLED - using mock identity providers");
        tracing::warn!("Complete logins with code=mock-code:<subject>[:<email>]");
        let mut names: Vec<String> = config.providers.iter().map(|p| p.name.clone()).collect();
        if names.is_empty() {
            names.push("mock".to_string());
        }
        let providers: Vec<Arc<dyn IdentityProvider>> = names
            .into_iter()
            .map(|name| Arc::new(MockIdentityProvider::new(name)) as Arc<dyn IdentityProvider>)
            .collect();
        ProviderRegistry::new(providers)?
    };

    #[cfg(not(feature = "dev-mode"))]
    let registry =
        ProviderRegistry::discover(&config.providers, &config.gateway.public_url).await?;

    tracing::info!(providers = ?registry.names(), "Identity providers ready");

    let login = Arc::new(LoginService::new(store, tokens, registry));
    let listen_addr = config.gateway.listen_addr.clone();
    let app = create_router(GatewayState::new(login, config.gateway));

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
