//! HTTP surface tests against an in-memory store and mock providers.

use std::sync::Arc;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD,
    COOKIE, LOCATION, ORIGIN, SET_COOKIE,
};
use axum::http::{HeaderValue, Method, StatusCode};
use axum_test::{TestResponse, TestServer};
use serde_json::Value;

use tessera_auth::{SymmetricKey, TokenConfig, TokenService};
use tessera_gateway::{create_router, GatewayConfig, GatewayState};
use tessera_login::{IdentityProvider, LoginService, MockIdentityProvider, ProviderRegistry};
use tessera_store::MemoryStore;

fn server_with(config: GatewayConfig, secret: &[u8]) -> TestServer {
    let tokens = TokenService::new(
        TokenConfig::default(),
        Arc::new(SymmetricKey::new(secret).unwrap()),
    );
    let providers: Vec<Arc<dyn IdentityProvider>> = vec![
        Arc::new(MockIdentityProvider::new("github")),
        Arc::new(MockIdentityProvider::new("google")),
    ];
    let login = LoginService::new(
        Arc::new(MemoryStore::new()),
        tokens,
        ProviderRegistry::new(providers).unwrap(),
    );
    let app = create_router(GatewayState::new(Arc::new(login), config));
    TestServer::new(app).unwrap()
}

fn server() -> TestServer {
    server_with(GatewayConfig::default(), b"gateway-secret")
}

fn cookie(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap()
}

/// Value of the named cookie among the response's `Set-Cookie` headers.
fn set_cookie_value(response: &TestResponse, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(|v| {
            v[prefix.len()..]
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

/// Walk begin and end for `github` and return the session token.
async fn login(server: &TestServer, subject: &str, email: Option<&str>) -> (Value, String) {
    let begin = server.get("/auth/begin/github").await;
    let state = set_cookie_value(&begin, "tessera_session_state").unwrap();

    let end = server
        .get("/auth/end/github")
        .add_query_param("code", MockIdentityProvider::code(subject, email))
        .add_query_param("state", &state)
        .add_header(COOKIE, cookie(&format!("tessera_session_state={state}")))
        .await;
    assert_eq!(end.status_code(), StatusCode::OK);

    let session = set_cookie_value(&end, "tessera_session").unwrap();
    (end.json::<Value>(), session)
}

#[tokio::test]
async fn health_check() {
    let response = server().get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["providers"], 2);
}

#[tokio::test]
async fn lists_providers() {
    let response = server().get("/providers").await;

    assert_eq!(
        response.json::<Value>(),
        serde_json::json!({ "providers": ["github", "google"] })
    );
}

#[tokio::test]
async fn begin_redirects_with_state_cookie() {
    let response = server().get("/auth/begin/github").await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    let location = response.headers()[LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with("https://mock.invalid/github/authorize?state="));

    let state = set_cookie_value(&response, "tessera_session_state").unwrap();
    assert!(location.ends_with(&state));
}

#[tokio::test]
async fn unknown_provider_is_not_found() {
    let response = server().get("/auth/begin/myspace").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn callback_sets_session_cookie() {
    let server = server();
    let (body, session) = login(&server, "octocat", Some("octo@example.com")).await;

    assert_eq!(body["user_id"], "1");
    assert_eq!(body["is_new_user"], true);
    assert_eq!(session.split('.').count(), 3);

    let (again, _) = login(&server, "octocat", None).await;
    assert_eq!(again["user_id"], "1");
    assert_eq!(again["is_new_user"], false);
}

#[tokio::test]
async fn session_cookie_is_strict_and_http_only() {
    let server = server();
    let begin = server.get("/auth/begin/github").await;
    let state = set_cookie_value(&begin, "tessera_session_state").unwrap();

    let end = server
        .get("/auth/end/github")
        .add_query_param("code", MockIdentityProvider::code("octocat", None))
        .add_query_param("state", &state)
        .add_header(COOKIE, cookie(&format!("tessera_session_state={state}")))
        .await;

    let headers: Vec<String> = end
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    let session = headers
        .iter()
        .find(|h| h.starts_with("tessera_session="))
        .unwrap();
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Strict"));
    assert!(headers
        .iter()
        .any(|h| h.starts_with("tessera_session_state=;") && h.contains("Max-Age=0")));
}

#[tokio::test]
async fn callback_rejects_state_mismatch() {
    let server = server();
    let begin = server.get("/auth/begin/github").await;
    let state = set_cookie_value(&begin, "tessera_session_state").unwrap();

    let response = server
        .get("/auth/end/github")
        .add_query_param("code", MockIdentityProvider::code("octocat", None))
        .add_query_param("state", "forged")
        .add_header(COOKIE, cookie(&format!("tessera_session_state={state}")))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let without_cookie = server
        .get("/auth/end/github")
        .add_query_param("code", MockIdentityProvider::code("octocat", None))
        .add_query_param("state", &state)
        .await;
    assert_eq!(without_cookie.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_without_code_is_bad_request() {
    let response = server()
        .get("/auth/end/github")
        .add_query_param("error", "access_denied")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_provider_code_is_bad_gateway() {
    let response = server()
        .get("/auth/end/github")
        .add_query_param("code", "garbage")
        .add_query_param("state", "s")
        .add_header(COOKIE, cookie("tessera_session_state=s"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn token_requires_session() {
    let response = server().get("/token").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "no_session");
}

#[tokio::test]
async fn token_with_foreign_session_is_unauthorized() {
    let foreign = server_with(GatewayConfig::default(), b"someone-else");
    let (_, token) = login(&foreign, "octocat", None).await;

    let response = server()
        .get("/token")
        .add_header(COOKIE, cookie(&format!("tessera_session={token}")))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "invalid_signature");
}

#[tokio::test]
async fn token_then_validate() {
    let server = server();
    let (_, session) = login(&server, "octocat", Some("octo@example.com")).await;

    let response = server
        .get("/token")
        .add_header(COOKIE, cookie(&format!("tessera_session={session}")))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    // A fresh refresh token is not rotated.
    assert_eq!(set_cookie_value(&response, "tessera_session"), None);

    let body = response.json::<Value>();
    assert_eq!(body["email"], "octo@example.com");
    assert!(body["exp"].as_i64().unwrap() > 0);
    let access = body["token"].as_str().unwrap().to_string();

    let report = server
        .get("/validate")
        .add_query_param("token", &access)
        .await;
    assert_eq!(report.status_code(), StatusCode::OK);
    let report = report.json::<Value>();
    assert_eq!(report["valid"], true);
    assert_eq!(report["claims"]["sub"], "1");
    assert_eq!(report["claims"]["aud"], "tessera");
}

#[tokio::test]
async fn validate_rejects_refresh_token() {
    let server = server();
    let (_, session) = login(&server, "octocat", None).await;

    let response = server
        .get("/validate")
        .add_query_param("token", &session)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let report = response.json::<Value>();
    assert_eq!(report["valid"], false);
    assert_eq!(report["error"], "malformed_token");
}

#[tokio::test]
async fn validate_without_token_is_bad_request() {
    let response = server().get("/validate").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        serde_json::json!({ "valid": false, "error": "missing_token" })
    );
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let config = GatewayConfig {
        cookie_secure: false,
        ..GatewayConfig::default()
    };
    let response = server_with(config, b"gateway-secret").get("/auth/logout").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let cleared = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cleared.starts_with("tessera_session=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert!(!cleared.contains("Secure"));
}

/// Send a CORS preflight for `GET /token` from `origin`.
async fn preflight(server: &TestServer, origin: &str) -> TestResponse {
    server
        .method(Method::OPTIONS, "/token")
        .add_header(ORIGIN, cookie(origin))
        .add_header(ACCESS_CONTROL_REQUEST_METHOD, cookie("GET"))
        .await
}

#[tokio::test]
async fn wildcard_cors_allows_any_origin() {
    let response = preflight(&server(), "https://anywhere.example").await;

    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(response
        .headers()
        .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
        .is_none());
}

#[tokio::test]
async fn listed_cors_origin_may_send_cookies() {
    let config = GatewayConfig {
        cors_origins: vec![
            "http://localhost:3000".to_string(),
            "https://app.example.com".to_string(),
        ],
        ..GatewayConfig::default()
    };
    let server = server_with(config, b"gateway-secret");

    let allowed = preflight(&server, "https://app.example.com").await;
    assert_eq!(
        allowed.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );
    assert_eq!(allowed.headers()[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let refused = preflight(&server, "https://evil.example").await;
    assert!(refused.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn access_token_is_not_a_session() {
    let server = server();
    let (_, session) = login(&server, "octocat", None).await;
    let access = server
        .get("/token")
        .add_header(COOKIE, cookie(&format!("tessera_session={session}")))
        .await
        .json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .get("/token")
        .add_header(COOKIE, cookie(&format!("tessera_session={access}")))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "malformed_token");
}
