//! Identity resolution and login orchestration for tessera.
//!
//! This crate turns a provider callback into a local user and a session:
//!
//! - **Providers**: OIDC discovery, authorization redirect and code exchange
//! - **Resolution**: mapping `(provider, subject)` to a local user, creating
//!   it on first sight
//! - **Orchestration**: the login flow state machine and token issuance
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tessera_auth::{keys, KeyConfig, TokenConfig, TokenService};
//! use tessera_login::{LoginOrchestrator, LoginService, ProviderConfig, ProviderRegistry};
//! use tessera_store::RocksStore;
//!
//! # async fn example(configs: Vec<ProviderConfig>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/tessera")?);
//! let keys = keys::load(&KeyConfig::Secret { secret: "change-me".to_string() })?;
//! let tokens = TokenService::new(TokenConfig::default(), keys);
//! let providers = ProviderRegistry::discover(&configs, "https://auth.example.com").await?;
//!
//! let service = LoginService::new(store, tokens, providers);
//! let start = service.begin_login("github").await?;
//! println!("redirect to {}", start.redirect_url);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod resolver;
pub mod service;
pub mod types;

pub use error::{LoginError, Result};
pub use lifecycle::{LoginFlow, LoginState};
pub use provider::{
    callback_url, DiscoveryDocument, IdentityProvider, OidcProvider, ProviderConfig,
    ProviderRegistry,
};
pub use resolver::IdentityResolver;
pub use service::{LoginOrchestrator, LoginService};
pub use types::{
    AccessGrant, LoginOutcome, LoginStart, ProviderIdentity, ResolvedIdentity, ValidationReport,
};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockIdentityProvider;
