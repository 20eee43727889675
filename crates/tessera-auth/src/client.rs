//! Client for services that accept tessera access tokens.
//!
//! A downstream service knows the login service's base URL, a shared secret
//! and the RSA public key. Provider names are fetched once over HTTP; access
//! tokens are checked offline against the public key.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::claims::TokenClaims;
use crate::error::{ClientError, Result};
use crate::keys::RsaKeyPair;
use crate::tokens::TokenService;
use crate::TokenConfig;

/// Body of `GET /providers`.
#[derive(Debug, Deserialize)]
struct ProvidersBody {
    providers: Vec<String>,
}

/// Client held by a downstream service.
pub struct ServiceClient {
    base_url: String,
    secret: String,
    http: reqwest::Client,
    tokens: TokenService,
    providers: Vec<String>,
}

impl ServiceClient {
    /// Build a client and fetch the provider list.
    ///
    /// A plain `http://` base URL is accepted with a warning. A trailing
    /// slash is dropped.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidBaseUrl` for any other scheme,
    /// `ClientError::KeyLoad` if the public key cannot be used, and a
    /// request or status error if the provider list cannot be fetched.
    pub async fn connect(
        base_url: &str,
        secret: impl Into<String>,
        public_key_path: &Path,
    ) -> std::result::Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url)?;
        let keys = RsaKeyPair::verifier_from_file(public_key_path)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let mut client = Self {
            base_url,
            secret: secret.into(),
            http,
            tokens: TokenService::new(TokenConfig::default(), Arc::new(keys)),
            providers: Vec::new(),
        };
        client.reload_providers().await?;
        Ok(client)
    }

    /// Provider names as of the last fetch.
    #[must_use]
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    /// Fetch the provider list again.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` for a non-success answer and
    /// `ClientError::Request` if the request or its body fails.
    pub async fn reload_providers(&mut self) -> std::result::Result<&[String], ClientError> {
        let url = format!("{}/providers", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret)
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Provider list request failed");
            return Err(ClientError::Status(status.as_u16()));
        }

        let body: ProvidersBody = response
            .json()
            .await
            .map_err(|e| ClientError::Request(format!("invalid response: {e}")))?;

        tracing::debug!(providers = ?body.providers, "Provider list loaded");
        self.providers = body.providers;
        Ok(&self.providers)
    }

    /// Check an access token offline.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`TokenService::verify_access_token`].
    /// `AuthError::needs_refresh` tells an expired token apart from a
    /// forged one.
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        self.tokens.verify_access_token(token)
    }
}

fn normalize_base_url(base_url: &str) -> std::result::Result<String, ClientError> {
    if !base_url.starts_with("https://") {
        if !base_url.starts_with("http://") {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        tracing::warn!(base_url = %base_url, "Login service base URL does not use https");
    }

    Ok(base_url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::{DateTime, Utc};
    use serde_json::json;
    use tessera_core::{UserData, UserId};
    use tessera_store::User;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::AuthError;
    use crate::keys::SymmetricKey;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn user() -> User {
        User {
            id: UserId::new(9),
            public_data: UserData::new(),
            private_data: UserData::new(),
            last_login: DateTime::<Utc>::UNIX_EPOCH,
            created_at: Utc::now(),
            authentications: Vec::new(),
        }
    }

    fn issuer(private: &str, public: &str) -> TokenService {
        let keys = RsaKeyPair::from_files(&fixture(private), &fixture(public)).unwrap();
        TokenService::new(TokenConfig::default(), Arc::new(keys))
    }

    async fn login_service() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/providers"))
            .and(header("authorization", "Bearer shared-secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "providers": ["github", "google"] })),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn connect_loads_providers_with_secret() {
        let server = login_service().await;
        let base = format!("{}/", server.uri());

        let client = ServiceClient::connect(&base, "shared-secret", &fixture("public.pem"))
            .await
            .unwrap();

        assert_eq!(client.providers(), ["github", "google"]);
    }

    #[tokio::test]
    async fn connect_fails_on_rejected_secret() {
        let server = login_service().await;

        let result = ServiceClient::connect(&server.uri(), "wrong", &fixture("public.pem")).await;

        assert!(matches!(result, Err(ClientError::Status(404))));
    }

    #[tokio::test]
    async fn connect_fails_without_public_key() {
        let server = login_service().await;

        let result =
            ServiceClient::connect(&server.uri(), "shared-secret", &fixture("missing.pem")).await;

        assert!(matches!(result, Err(ClientError::KeyLoad(_))));
    }

    #[tokio::test]
    async fn validates_access_tokens_offline() {
        let server = login_service().await;
        let client = ServiceClient::connect(&server.uri(), "shared-secret", &fixture("public.pem"))
            .await
            .unwrap();

        let tokens = issuer("private_pkcs8.pem", "public.pem");
        let access = tokens.issue_access_token(&user()).unwrap();
        let claims = client.validate_token(&access.token).unwrap();
        assert_eq!(claims.subject, UserId::new(9));

        let refresh = tokens.issue_refresh_token(&user()).unwrap();
        assert!(matches!(
            client.validate_token(&refresh),
            Err(AuthError::MalformedToken)
        ));

        let foreign = issuer("foreign_private.pem", "foreign_public.pem")
            .issue_access_token(&user())
            .unwrap();
        assert!(matches!(
            client.validate_token(&foreign.token),
            Err(AuthError::InvalidSignature)
        ));

        let hmac = TokenService::new(
            TokenConfig::default(),
            Arc::new(SymmetricKey::new(b"not-rsa").unwrap()),
        )
        .issue_access_token(&user())
        .unwrap();
        assert!(client.validate_token(&hmac.token).is_err());
    }

    #[test]
    fn base_url_schemes() {
        assert_eq!(
            normalize_base_url("https://auth.example.com/").unwrap(),
            "https://auth.example.com"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8080").unwrap(),
            "http://localhost:8080"
        );
        assert!(matches!(
            normalize_base_url("auth.example.com"),
            Err(ClientError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            normalize_base_url("ftp://auth.example.com"),
            Err(ClientError::InvalidBaseUrl(_))
        ));
    }
}
