#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use spotify_term::{
    Error, Res,
    config::{Config, Endpoints},
    spotify::auth::Authorize,
    types::{Authorization, AuthorizationCode, TokenRecord},
};
use wiremock::MockServer;

/// Authorizer that hands out a fixed code and counts how often it was asked.
pub struct CountingAuthorizer {
    code: Option<&'static str>,
    calls: AtomicUsize,
}

impl CountingAuthorizer {
    pub fn with_code(code: &'static str) -> Self {
        Self {
            code: Some(code),
            calls: AtomicUsize::new(0),
        }
    }

    /// Behaves like a callback that arrived without a code.
    pub fn without_code() -> Self {
        Self {
            code: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Authorize for CountingAuthorizer {
    async fn authorize(&self, config: &Config) -> Res<Authorization> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.code {
            Some(code) => Ok(Authorization {
                code: AuthorizationCode(code.to_string()),
                redirect_uri: config.redirect_uri(),
            }),
            None => Err(Error::MissingCode),
        }
    }
}

impl Authorize for &CountingAuthorizer {
    async fn authorize(&self, config: &Config) -> Res<Authorization> {
        (**self).authorize(config).await
    }
}

pub fn test_config() -> Config {
    Config {
        client_id: "client-1".to_string(),
        client_secret: "secret-1".to_string(),
        redirect_port: "5958".to_string(),
    }
}

pub fn endpoints_for(server: &MockServer) -> Endpoints {
    Endpoints::new(server.uri(), format!("{}/v1", server.uri()))
}

pub fn stored_record(refresh_token: &str) -> TokenRecord {
    TokenRecord {
        access_token: "A1".to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 3600,
        refresh_token: refresh_token.to_string(),
        scope: "user-read-playback-state".to_string(),
    }
}

/// Refresh answer without a refresh token, as Spotify usually sends it.
pub fn refresh_body(access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": "user-modify-playback-state user-read-currently-playing user-read-playback-state"
    })
}
