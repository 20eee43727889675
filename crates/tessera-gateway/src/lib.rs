//! HTTP gateway for the tessera login service.
//!
//! This crate exposes the login flow to browsers and token checks to
//! downstream services. It handles:
//!
//! - Provider redirects and callbacks
//! - The refresh token session cookie
//! - Access token issuance and validation
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────┐        ┌───────────────────────┐
//! │       Browsers        │        │  Downstream services  │
//! │ (/auth/*, /token)     │        │     (/validate)       │
//! └───────────────────────┘        └───────────────────────┘
//!             │                                │
//!             ▼                                ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    tessera-gateway                       │
//! │  ┌───────────────┐ ┌──────────────┐ ┌────────────────┐  │
//! │  │    Session    │ │    Router    │ │     Error      │  │
//! │  │    Cookies    │ │  + Handlers  │ │    Envelope    │  │
//! │  └───────────────┘ └──────────────┘ └────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌──────────┐   ┌──────────┐
//!        │  Login   │   │  Tokens  │   │  Store   │
//!        │ Service  │   │  (JWT)   │   │ (RocksDB)│
//!        └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tessera_auth::{keys, KeyConfig, TokenConfig, TokenService};
//! use tessera_gateway::{create_router, GatewayConfig, GatewayState};
//! use tessera_login::{LoginService, ProviderConfig, ProviderRegistry};
//! use tessera_store::RocksStore;
//!
//! # async fn example(providers: Vec<ProviderConfig>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::default();
//! let store = Arc::new(RocksStore::open("/tmp/tessera")?);
//! let keys = keys::load(&KeyConfig::Secret { secret: "change-me".to_string() })?;
//! let tokens = TokenService::new(TokenConfig::default(), keys);
//! let registry = ProviderRegistry::discover(&providers, &config.public_url).await?;
//!
//! let login = Arc::new(LoginService::new(store, tokens, registry));
//! let app = create_router(GatewayState::new(login, config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

pub use config::{ConfigError, GatewayConfig, ServiceConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use session::SessionCookie;
pub use state::GatewayState;
