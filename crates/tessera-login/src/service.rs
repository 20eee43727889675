//! Login orchestration.
//!
//! This module provides the `LoginOrchestrator` trait and `LoginService`
//! implementation that ties providers, identity resolution and tokens
//! together.

use std::sync::Arc;

use async_trait::async_trait;
use tessera_auth::TokenService;
use tessera_store::Store;

use crate::error::{LoginError, Result};
use crate::lifecycle::{LoginFlow, LoginState};
use crate::provider::ProviderRegistry;
use crate::resolver::IdentityResolver;
use crate::types::{AccessGrant, LoginOutcome, LoginStart, ValidationReport};

/// Trait defining the login operations.
///
/// The service keeps no session state. The refresh token held by the client
/// is the session.
#[async_trait]
pub trait LoginOrchestrator: Send + Sync {
    /// Start a login with the named provider.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::UnknownProvider` if the provider is not configured.
    async fn begin_login(&self, provider: &str) -> Result<LoginStart>;

    /// Finish a login from the provider callback and issue a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Provider` if the code exchange fails, or a storage
    /// or signing error.
    async fn complete_login(&self, provider: &str, code: &str) -> Result<LoginOutcome>;

    /// Mint an access token from a refresh token, rotating the refresh
    /// token when it is old enough.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Auth` if the refresh token fails verification and
    /// `LoginError::UserNotFound` if its user no longer exists.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessGrant>;

    /// Check an access token on behalf of a downstream service.
    async fn validate_access_token(&self, token: &str) -> ValidationReport;

    /// End the session. Nothing is stored, so this only records the event.
    async fn logout(&self) -> LoginState;

    /// Names of the configured providers.
    fn providers(&self) -> Vec<String>;
}

/// The main login service implementation.
pub struct LoginService<S: Store> {
    resolver: IdentityResolver<S>,
    tokens: TokenService,
    providers: ProviderRegistry,
}

impl<S: Store> LoginService<S> {
    /// Create a new login service.
    #[must_use]
    pub fn new(store: Arc<S>, tokens: TokenService, providers: ProviderRegistry) -> Self {
        Self {
            resolver: IdentityResolver::new(store),
            tokens,
            providers,
        }
    }

    /// Get the identity resolver.
    #[must_use]
    pub const fn resolver(&self) -> &IdentityResolver<S> {
        &self.resolver
    }

    /// Get the token service.
    #[must_use]
    pub const fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

#[async_trait]
impl<S: Store + 'static> LoginOrchestrator for LoginService<S> {
    async fn begin_login(&self, provider: &str) -> Result<LoginStart> {
        let mut flow = LoginFlow::start();
        let provider = self.providers.get(provider)?;

        let state = uuid::Uuid::new_v4().to_string();
        let redirect_url = provider.authorization_url(&state)?;
        flow.advance(LoginState::AwaitingProviderCallback)?;

        tracing::debug!(provider = provider.name(), "Starting login");

        Ok(LoginStart {
            redirect_url,
            state,
        })
    }

    async fn complete_login(&self, provider: &str, code: &str) -> Result<LoginOutcome> {
        let mut flow = LoginFlow::resume(LoginState::AwaitingProviderCallback);
        let provider = self.providers.get(provider)?;

        let identity = provider.complete(code).await?;
        let resolved =
            self.resolver
                .resolve(provider.name(), &identity.subject, identity.email.as_deref())?;
        flow.advance(LoginState::IdentityResolved)?;

        let mut user = resolved.user;
        self.resolver.record_login(&mut user)?;

        let refresh_token = self.tokens.issue_refresh_token(&user)?;
        flow.advance(LoginState::SessionEstablished)?;

        tracing::info!(
            user_id = %user.id,
            provider = provider.name(),
            is_new_user = resolved.is_new_user,
            "Login complete"
        );

        Ok(LoginOutcome {
            refresh_token,
            user,
            is_new_user: resolved.is_new_user,
        })
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessGrant> {
        let mut flow = LoginFlow::resume(LoginState::SessionEstablished);

        let claims = self.tokens.verify_refresh_token(refresh_token)?;
        let user = self
            .resolver
            .store()
            .get_user(&claims.subject)?
            .ok_or(LoginError::UserNotFound(claims.subject))?;

        let rotated_refresh_token = if self.tokens.should_rotate(&claims) {
            tracing::debug!(user_id = %user.id, "Rotating refresh token");
            Some(self.tokens.issue_refresh_token(&user)?)
        } else {
            None
        };

        let access = self.tokens.issue_access_token(&user)?;
        flow.advance(LoginState::AccessTokenIssued)?;

        Ok(AccessGrant {
            access_token: access.token,
            expires_at: access.expires_at,
            rotated_refresh_token,
            email: user.primary_email().map(str::to_string),
        })
    }

    async fn validate_access_token(&self, token: &str) -> ValidationReport {
        match self.tokens.verify_access_token(token) {
            Ok(claims) => ValidationReport::valid(claims),
            Err(e) => ValidationReport::invalid(e.code()),
        }
    }

    async fn logout(&self) -> LoginState {
        let mut flow = LoginFlow::resume(LoginState::SessionEstablished);
        if let Err(e) = flow.advance(LoginState::LoggedOut) {
            tracing::warn!(error = %e, "Logout outside of a session");
        }
        tracing::debug!("Logged out");
        flow.state()
    }

    fn providers(&self) -> Vec<String> {
        self.providers.names().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_auth::{SymmetricKey, TokenConfig};
    use tessera_store::MemoryStore;

    use crate::provider::{IdentityProvider, MockIdentityProvider};

    fn service_with(config: TokenConfig) -> LoginService<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(config, Arc::new(SymmetricKey::new(b"secret").unwrap()));
        let providers: Vec<Arc<dyn IdentityProvider>> = vec![
            Arc::new(MockIdentityProvider::new("github")),
            Arc::new(MockIdentityProvider::new("google")),
        ];
        LoginService::new(store, tokens, ProviderRegistry::new(providers).unwrap())
    }

    fn service() -> LoginService<MemoryStore> {
        service_with(TokenConfig::default())
    }

    #[tokio::test]
    async fn begin_login_returns_state_and_url() {
        let service = service();
        let start = service.begin_login("github").await.unwrap();

        assert!(!start.state.is_empty());
        assert!(start.redirect_url.contains(&start.state));

        let other = service.begin_login("github").await.unwrap();
        assert_ne!(start.state, other.state);
    }

    #[tokio::test]
    async fn unknown_provider() {
        let service = service();
        assert!(matches!(
            service.begin_login("gitlab").await,
            Err(LoginError::UnknownProvider(_))
        ));
        assert!(matches!(
            service.complete_login("gitlab", "mock-code:1").await,
            Err(LoginError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn complete_login_creates_then_reuses_user() {
        let service = service();
        let code = MockIdentityProvider::code("42", Some("a@x.com"));

        let first = service.complete_login("github", &code).await.unwrap();
        assert!(first.is_new_user);
        assert!(first.user.has_logged_in());

        let claims = service
            .tokens()
            .verify_refresh_token(&first.refresh_token)
            .unwrap();
        assert_eq!(claims.subject, first.user.id);

        let second = service.complete_login("github", &code).await.unwrap();
        assert!(!second.is_new_user);
        assert_eq!(second.user.id, first.user.id);
    }

    #[tokio::test]
    async fn refresh_issues_access_token_with_email() {
        let service = service();
        let login = service
            .complete_login("github", &MockIdentityProvider::code("7", Some("e@x.com")))
            .await
            .unwrap();

        let grant = service
            .refresh_access_token(&login.refresh_token)
            .await
            .unwrap();

        assert_eq!(grant.email.as_deref(), Some("e@x.com"));
        assert!(grant.rotated_refresh_token.is_none());

        let report = service.validate_access_token(&grant.access_token).await;
        assert!(report.valid);
        assert_eq!(report.claims.unwrap().subject, login.user.id);
    }

    #[tokio::test]
    async fn refresh_rotates_old_tokens() {
        let service = service_with(TokenConfig {
            refresh_token_ttl_seconds: 10,
            min_age_for_refresh_seconds: 1,
            ..TokenConfig::default()
        });
        let login = service
            .complete_login("github", &MockIdentityProvider::code("7", None))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;

        let grant = service
            .refresh_access_token(&login.refresh_token)
            .await
            .unwrap();
        let rotated = grant.rotated_refresh_token.unwrap();
        assert!(service.tokens().verify_refresh_token(&rotated).is_ok());
        assert_eq!(grant.email, None);
    }

    #[tokio::test]
    async fn refresh_rejects_access_token_and_garbage() {
        let service = service();
        assert!(matches!(
            service.refresh_access_token("garbage").await,
            Err(LoginError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn refresh_for_missing_user() {
        let service = service();
        let orphan = tessera_store::User {
            id: tessera_core::UserId::new(999),
            public_data: tessera_core::UserData::new(),
            private_data: tessera_core::UserData::new(),
            last_login: chrono::Utc::now(),
            created_at: chrono::Utc::now(),
            authentications: Vec::new(),
        };
        let token = service.tokens().issue_refresh_token(&orphan).unwrap();

        assert!(matches!(
            service.refresh_access_token(&token).await,
            Err(LoginError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn validate_rejects_refresh_token() {
        let service = service();
        let login = service
            .complete_login("google", &MockIdentityProvider::code("1", None))
            .await
            .unwrap();

        let report = service.validate_access_token(&login.refresh_token).await;
        assert!(!report.valid);
        assert_eq!(report.error, Some("malformed_token"));
    }

    #[tokio::test]
    async fn logout_and_providers() {
        let service = service();
        assert_eq!(service.logout().await, LoginState::LoggedOut);
        assert_eq!(service.providers(), ["github", "google"]);
    }
}
