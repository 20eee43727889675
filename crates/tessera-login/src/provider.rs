//! Identity provider collaborators.
//!
//! A provider turns an authorization code into a `(subject, email)` pair.
//! The OIDC implementation speaks just enough of the protocol for that:
//! discovery, the authorization redirect, the code exchange and userinfo.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{LoginError, Result};
use crate::types::ProviderIdentity;

/// Trait for external identity providers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The configured provider name, used in routes and as the identity key.
    fn name(&self) -> &str;

    /// Build the URL the browser is sent to.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Provider` if the URL cannot be built.
    fn authorization_url(&self, state: &str) -> Result<String>;

    /// Exchange an authorization code for the user's identity.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Provider` if the exchange or the userinfo fetch fails.
    async fn complete(&self, code: &str) -> Result<ProviderIdentity>;
}

/// Configuration for an OIDC provider.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// Name used in routes, for example `github`.
    pub name: String,

    /// Issuer URL. Discovery is fetched from
    /// `{issuer_url}/.well-known/openid-configuration` unless `discovery_url` is set.
    pub issuer_url: String,

    /// Explicit discovery document URL.
    #[serde(default)]
    pub discovery_url: Option<String>,

    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Requested scopes.
    #[serde(default = "ProviderConfig::default_scopes")]
    pub scopes: Vec<String>,
}

impl ProviderConfig {
    fn default_scopes() -> Vec<String> {
        vec!["openid".to_string(), "email".to_string(), "profile".to_string()]
    }

    /// Get the discovery document URL.
    #[must_use]
    pub fn discovery_url(&self) -> String {
        self.discovery_url.clone().unwrap_or_else(|| {
            format!(
                "{}/.well-known/openid-configuration",
                self.issuer_url.trim_end_matches('/')
            )
        })
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("issuer_url", &self.issuer_url)
            .field("discovery_url", &self.discovery_url)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// The parts of an OIDC discovery document we use.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    /// Where the browser authorizes.
    pub authorization_endpoint: String,
    /// Where codes are exchanged.
    pub token_endpoint: String,
    /// Where the user profile is read.
    pub userinfo_endpoint: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// An OpenID Connect provider.
pub struct OidcProvider {
    config: ProviderConfig,
    redirect_url: String,
    endpoints: DiscoveryDocument,
    http: reqwest::Client,
}

impl OidcProvider {
    /// Fetch the discovery document and build the provider.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Provider` if discovery fails.
    pub async fn discover(config: ProviderConfig, redirect_url: String) -> Result<Self> {
        let http = reqwest::Client::new();
        let url = config.discovery_url();

        tracing::debug!(provider = %config.name, url = %url, "Fetching OIDC discovery document");

        let endpoints = http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| LoginError::provider(&config.name, e))?
            .json::<DiscoveryDocument>()
            .await
            .map_err(|e| LoginError::provider(&config.name, e))?;

        Ok(Self {
            config,
            redirect_url,
            endpoints,
            http,
        })
    }

    /// Build a provider from known endpoints without discovery.
    #[must_use]
    pub fn with_endpoints(
        config: ProviderConfig,
        redirect_url: String,
        endpoints: DiscoveryDocument,
    ) -> Self {
        Self {
            config,
            redirect_url,
            endpoints,
            http: reqwest::Client::new(),
        }
    }

    /// The callback URL registered with the provider.
    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.endpoints.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| LoginError::provider(&self.config.name, e))?
            .json::<TokenResponse>()
            .await
            .map_err(|e| LoginError::provider(&self.config.name, e))?;

        Ok(response.access_token)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo> {
        self.http
            .get(&self.endpoints.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| LoginError::provider(&self.config.name, e))?
            .json::<UserInfo>()
            .await
            .map_err(|e| LoginError::provider(&self.config.name, e))
    }
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn authorization_url(&self, state: &str) -> Result<String> {
        let scope = self.config.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.endpoints.authorization_endpoint,
            [
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
            ],
        )
        .map_err(|e| LoginError::provider(&self.config.name, e))?;

        Ok(url.into())
    }

    async fn complete(&self, code: &str) -> Result<ProviderIdentity> {
        let access_token = self.exchange_code(code).await?;
        let info = self.fetch_userinfo(&access_token).await?;

        if info.sub.is_empty() {
            return Err(LoginError::provider(&self.config.name, "userinfo has no subject"));
        }

        Ok(ProviderIdentity {
            subject: info.sub,
            email: info.email.filter(|email| !email.is_empty()),
        })
    }
}

/// The configured providers, built once at startup.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IdentityProvider>>,
    order: Vec<String>,
}

impl ProviderRegistry {
    /// Build a registry from providers.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Configuration` if the list is empty or two
    /// providers share a name.
    pub fn new(providers: Vec<Arc<dyn IdentityProvider>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(LoginError::Configuration(
                "no identity providers configured".to_string(),
            ));
        }

        let mut map = HashMap::with_capacity(providers.len());
        let mut order = Vec::with_capacity(providers.len());
        for provider in providers {
            let name = provider.name().to_string();
            if map.insert(name.clone(), provider).is_some() {
                return Err(LoginError::Configuration(format!(
                    "duplicate provider name: {name}"
                )));
            }
            order.push(name);
        }

        Ok(Self {
            providers: map,
            order,
        })
    }

    /// Discover every configured OIDC provider.
    ///
    /// Callback URLs are `{public_url}/auth/end/{name}`.
    ///
    /// # Errors
    ///
    /// Returns an error if any discovery fails or no provider is configured.
    pub async fn discover(configs: &[ProviderConfig], public_url: &str) -> Result<Self> {
        let mut providers: Vec<Arc<dyn IdentityProvider>> = Vec::with_capacity(configs.len());
        for config in configs {
            let redirect_url = callback_url(public_url, &config.name);
            let provider = OidcProvider::discover(config.clone(), redirect_url).await?;
            tracing::info!(provider = %config.name, "Identity provider ready");
            providers.push(Arc::new(provider));
        }
        Self::new(providers)
    }

    /// Get a provider by name.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::UnknownProvider` if no provider has this name.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn IdentityProvider>> {
        self.providers
            .get(name)
            .ok_or_else(|| LoginError::UnknownProvider(name.to_string()))
    }

    /// Provider names in configuration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.order)
            .finish()
    }
}

/// The callback URL for a provider.
#[must_use]
pub fn callback_url(public_url: &str, provider: &str) -> String {
    format!("{}/auth/end/{provider}", public_url.trim_end_matches('/'))
}

/// A mock identity provider for testing.
///
/// This provider accepts codes in the format `mock-code:<subject>` or
/// `mock-code:<subject>:<email>` and returns the encoded identity.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockIdentityProvider {
    name: String,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockIdentityProvider {
    /// Create a mock provider with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Build a code the mock provider accepts.
    #[must_use]
    pub fn code(subject: &str, email: Option<&str>) -> String {
        match email {
            Some(email) => format!("mock-code:{subject}:{email}"),
            None => format!("mock-code:{subject}"),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorization_url(&self, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &format!("https://mock.invalid/{}/authorize", self.name),
            [("state", state)],
        )
        .map_err(|e| LoginError::provider(&self.name, e))?;
        Ok(url.into())
    }

    async fn complete(&self, code: &str) -> Result<ProviderIdentity> {
        let rest = code
            .strip_prefix("mock-code:")
            .ok_or_else(|| LoginError::provider(&self.name, "expected mock-code:<subject>"))?;

        let (subject, email) = match rest.split_once(':') {
            Some((subject, email)) => (subject, Some(email.to_string())),
            None => (rest, None),
        };

        if subject.is_empty() {
            return Err(LoginError::provider(&self.name, "empty subject"));
        }

        Ok(ProviderIdentity {
            subject: subject.to_string(),
            email,
        })
    }
}
