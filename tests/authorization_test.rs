mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use reqwest::{StatusCode, Url};
use serde_json::json;
use spotify_term::{
    Error, cli,
    config::{Config, ConfigStore, StoragePaths},
    management::TokenStore,
    server::CallbackServer,
    spotify::{
        auth::{AuthorizationFlow, Authorize, TokenProvider},
        player::PlayerClient,
    },
    types::AuthorizationCode,
    utils,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

fn callback_url(server: &CallbackServer, query: &str) -> String {
    format!("http://{}/callback?{}", server.local_addr(), query)
}

/// Decodes an `application/x-www-form-urlencoded` request body.
fn form_fields(body: &[u8]) -> HashMap<String, String> {
    let body = String::from_utf8_lossy(body);
    Url::parse(&format!("http://form.invalid/?{}", body))
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::test]
async fn callback_with_code_completes_flow() {
    let server = CallbackServer::start(0, "s1").await.unwrap();
    let url = callback_url(&server, "code=XYZ&state=s1");
    let request = tokio::spawn(async move { reqwest::get(url).await });

    let code = server.wait_for_code(Duration::from_secs(5)).await.unwrap();
    assert_eq!(code, AuthorizationCode("XYZ".to_string()));

    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn callback_over_ipv6_loopback_completes_flow() {
    let server = CallbackServer::start(0, "s1").await.unwrap();
    let Some(v6) = server.local_addrs().iter().find(|addr| addr.is_ipv6()).copied() else {
        // host without IPv6
        return;
    };
    assert_eq!(v6.port(), server.local_addr().port());

    let url = format!("http://{}/callback?code=XYZ&state=s1", v6);
    let request = tokio::spawn(async move { reqwest::get(url).await });

    let code = server.wait_for_code(Duration::from_secs(5)).await.unwrap();
    assert_eq!(code, AuthorizationCode("XYZ".to_string()));
    assert_eq!(request.await.unwrap().unwrap().status(), StatusCode::OK);
}

#[tokio::test]
async fn callback_without_code_fails_instead_of_hanging() {
    let server = CallbackServer::start(0, "s1").await.unwrap();
    let url = callback_url(&server, "state=s1");
    let request = tokio::spawn(async move { reqwest::get(url).await });

    let outcome = server.wait_for_code(Duration::from_secs(5)).await;
    assert!(matches!(outcome, Err(Error::MissingCode)));

    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_with_foreign_state_is_rejected() {
    let server = CallbackServer::start(0, "s1").await.unwrap();
    let url = callback_url(&server, "code=XYZ&state=forged");
    tokio::spawn(async move { reqwest::get(url).await });

    let outcome = server.wait_for_code(Duration::from_secs(5)).await;
    assert!(matches!(outcome, Err(Error::StateMismatch)));
}

#[tokio::test]
async fn denied_authorization_is_reported() {
    let server = CallbackServer::start(0, "s1").await.unwrap();
    let url = callback_url(&server, "error=access_denied&state=s1");
    tokio::spawn(async move { reqwest::get(url).await });

    let outcome = server.wait_for_code(Duration::from_secs(5)).await;
    assert!(matches!(outcome, Err(Error::AuthorizationDenied(reason)) if reason == "access_denied"));
}

#[tokio::test]
async fn unanswered_flow_times_out_and_releases_port() {
    let server = CallbackServer::start(0, "s1").await.unwrap();
    let addr = server.local_addr();

    let outcome = server.wait_for_code(Duration::from_millis(100)).await;
    assert!(matches!(outcome, Err(Error::AuthorizationTimedOut(_))));

    // The listener is gone, so the port can be bound again.
    tokio::net::TcpListener::bind(addr).await.unwrap();
}

#[tokio::test]
async fn listener_is_shut_down_after_code_is_captured() {
    let server = CallbackServer::start(0, "s1").await.unwrap();
    let addr = server.local_addr();
    let url = callback_url(&server, "code=XYZ&state=s1");
    let request = tokio::spawn(async move { reqwest::get(url).await });

    server.wait_for_code(Duration::from_secs(5)).await.unwrap();
    request.await.unwrap().unwrap();

    tokio::net::TcpListener::bind(addr).await.unwrap();
}

#[tokio::test]
async fn flow_rejects_invalid_redirect_port() {
    let flow = AuthorizationFlow::new(Default::default()).without_browser();
    let config = Config {
        redirect_port: "not-a-port".to_string(),
        ..common::test_config()
    };

    assert!(matches!(
        flow.authorize(&config).await,
        Err(Error::Config(_))
    ));
}

/// Plays the user's browser: follows the authorization link straight to the
/// redirect URI with the given code, remembering the redirect URI it saw.
fn browser_returning(
    code: &'static str,
    seen_redirect: Arc<Mutex<Option<String>>>,
) -> impl Fn(&str) + Send + Sync + 'static {
    move |link: &str| {
        let link = Url::parse(link).unwrap();
        let query: HashMap<String, String> = link.query_pairs().into_owned().collect();
        *seen_redirect.lock().unwrap() = Some(query["redirect_uri"].clone());
        let callback = format!(
            "{}?code={}&state={}",
            query["redirect_uri"].replace("localhost", "127.0.0.1"),
            code,
            query["state"]
        );
        tokio::spawn(async move { reqwest::get(callback).await });
    }
}

#[tokio::test]
async fn fresh_setup_then_login_stores_tokens() {
    let home = tempfile::tempdir().unwrap();
    let paths = StoragePaths::in_dir(home.path());

    // setup: three prompts, port 0 lets the listener pick a free port
    let config_store = ConfigStore::new(paths.config_file());
    let mut input = "client-1\nsecret-1\n0\n".as_bytes();
    let mut output = Vec::new();
    let config = config_store
        .load_or_create_with(&mut input, &mut output)
        .await
        .unwrap();
    assert_eq!(config_store.load().await.unwrap(), Some(config.clone()));

    // login: authorization flow, then the authorization-code grant
    let accounts = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header(
            "authorization",
            utils::basic_credentials("client-1", "secret-1").as_str(),
        ))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=XYZ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "R1",
            "scope": "user-read-playback-state"
        })))
        .expect(1)
        .mount(&accounts)
        .await;

    let seen_redirect = Arc::new(Mutex::new(None));
    let endpoints = common::endpoints_for(&accounts);
    let flow = AuthorizationFlow::new(endpoints.clone())
        .with_timeout(Duration::from_secs(10))
        .with_launcher(browser_returning("XYZ", seen_redirect.clone()));
    let provider = TokenProvider::new(
        config,
        TokenStore::new(paths.token_file()),
        endpoints.clone(),
        flow,
    );
    let session = cli::Session::new(provider, PlayerClient::new(endpoints));

    cli::login(&session, false).await.unwrap();

    let record = TokenStore::new(paths.token_file())
        .load()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.access_token, "A1");
    assert_eq!(record.refresh_token, "R1");

    // the code grant repeats the redirect URI of the authorization link,
    // which carries the port the listener actually bound
    let seen = seen_redirect.lock().unwrap().clone().unwrap();
    assert!(!seen.contains(":0/"));
    let requests = accounts.received_requests().await.unwrap();
    let grant = form_fields(&requests[0].body);
    assert_eq!(grant["redirect_uri"], seen);
}

#[tokio::test]
async fn fixed_port_uses_one_redirect_uri_for_link_and_grant() {
    let port = free_port();
    let config = Config {
        redirect_port: port.to_string(),
        ..common::test_config()
    };
    let expected = format!("http://localhost:{}/callback", port);
    assert_eq!(config.redirect_uri(), expected);

    let accounts = MockServer::start().await;
    let encoded = Url::parse_with_params("http://form.invalid/", &[("redirect_uri", &expected)])
        .unwrap()
        .query()
        .unwrap()
        .to_string();
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(encoded.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1",
            "refresh_token": "R1"
        })))
        .expect(1)
        .mount(&accounts)
        .await;

    let home = tempfile::tempdir().unwrap();
    let seen_redirect = Arc::new(Mutex::new(None));
    let endpoints = common::endpoints_for(&accounts);
    let flow = AuthorizationFlow::new(endpoints.clone())
        .with_timeout(Duration::from_secs(10))
        .with_launcher(browser_returning("XYZ", seen_redirect.clone()));
    let provider = TokenProvider::new(
        config,
        TokenStore::new(StoragePaths::in_dir(home.path()).token_file()),
        endpoints,
        flow,
    );

    let record = provider.login().await.unwrap();
    assert_eq!(record.access_token, "A1");
    assert_eq!(seen_redirect.lock().unwrap().as_deref(), Some(expected.as_str()));
}
