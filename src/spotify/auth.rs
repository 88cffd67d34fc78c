use std::{future::Future, time::Duration};

use reqwest::{Client, header::AUTHORIZATION};

use crate::{
    Error, Res,
    config::{Config, Endpoints},
    info,
    management::TokenStore,
    server::CallbackServer,
    types::{Authorization, Grant, TokenRecord, TokenResponse},
    utils, warning,
};

/// How long the flow waits for the user to finish in the browser.
pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Presents the authorization URL to the user.
pub type Launcher = Box<dyn Fn(&str) + Send + Sync>;

/// Source of authorization codes for the token provider.
///
/// Implementations report the redirect URI they presented to the provider
/// together with the code, so the code grant can repeat it.
pub trait Authorize {
    fn authorize(&self, config: &Config) -> impl Future<Output = Res<Authorization>>;
}

/// Browser-based authorization: starts the redirect listener, shows the
/// authorization URL and waits for the callback.
///
/// States: awaiting redirect until the first callback (or the timeout),
/// then authorized or failed. The listener never outlives [`Authorize::authorize`].
pub struct AuthorizationFlow {
    endpoints: Endpoints,
    timeout: Duration,
    launcher: Launcher,
}

impl AuthorizationFlow {
    /// Prints the URL and tries to open it in the default browser.
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            timeout: DEFAULT_AUTHORIZATION_TIMEOUT,
            launcher: Box::new(|url: &str| {
                print_authorize_url(url);
                if webbrowser::open(url).is_err() {
                    warning!("Failed to open browser. Please open the link above manually.");
                }
            }),
        }
    }

    /// Only prints the URL.
    #[must_use]
    pub fn without_browser(mut self) -> Self {
        self.launcher = Box::new(print_authorize_url);
        self
    }

    #[must_use]
    pub fn with_launcher(mut self, launcher: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Authorize for AuthorizationFlow {
    async fn authorize(&self, config: &Config) -> Res<Authorization> {
        let state = utils::generate_state();
        let server = CallbackServer::start(config.port()?, state.clone()).await?;
        let redirect_uri = utils::redirect_uri(&server.local_addr().port().to_string());

        let url = utils::build_authorize_url(
            &self.endpoints.authorize_url(),
            &config.client_id,
            &redirect_uri,
            &state,
        )?;
        (self.launcher)(&url);

        let code = server.wait_for_code(self.timeout).await?;
        Ok(Authorization { code, redirect_uri })
    }
}

fn print_authorize_url(url: &str) {
    info!("Please open this link in your browser to authorize the app: {}", url);
}

/// Hands out access tokens, driving the authorization flow on first use and
/// the refresh grant afterwards.
///
/// Every call performs a live exchange; tokens are not cached in-process and
/// `expires_in` is not consulted.
pub struct TokenProvider<A> {
    http: Client,
    config: Config,
    store: TokenStore,
    endpoints: Endpoints,
    authorizer: A,
}

impl<A: Authorize> TokenProvider<A> {
    pub fn new(config: Config, store: TokenStore, endpoints: Endpoints, authorizer: A) -> Self {
        Self {
            http: Client::new(),
            config,
            store,
            endpoints,
            authorizer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub async fn get_access_token(&self) -> Res<String> {
        let record = match self.store.load().await? {
            Some(record) => self.refresh(&record.refresh_token).await?,
            None => self.login().await?,
        };
        Ok(record.access_token)
    }

    /// Runs the authorization flow and the authorization-code grant,
    /// replacing any stored record.
    pub async fn login(&self) -> Res<TokenRecord> {
        let Authorization { code, redirect_uri } = self.authorizer.authorize(&self.config).await?;
        self.exchange(Grant::AuthorizationCode { code, redirect_uri }).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Res<TokenRecord> {
        if refresh_token.is_empty() {
            return Err(Error::Auth(
                "stored token has no refresh token, run `login --force`".to_string(),
            ));
        }
        self.exchange(Grant::RefreshToken(refresh_token.to_string()))
            .await
    }

    async fn exchange(&self, grant: Grant) -> Res<TokenRecord> {
        let configured_uri = self.config.redirect_uri();
        let mut form = vec![("grant_type", grant.grant_type())];
        match &grant {
            Grant::AuthorizationCode { code, redirect_uri } => {
                form.push(("code", code.as_str()));
                form.push(("redirect_uri", redirect_uri.as_str()));
            }
            Grant::RefreshToken(token) => {
                form.push(("refresh_token", token.as_str()));
                form.push(("redirect_uri", configured_uri.as_str()));
            }
        }

        tracing::debug!(grant_type = grant.grant_type(), "requesting token");
        let response = self
            .http
            .post(self.endpoints.token_url())
            .header(
                AUTHORIZATION,
                utils::basic_credentials(&self.config.client_id, &self.config.client_secret),
            )
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, "token endpoint answered");

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenResponse>(&body)
                .ok()
                .and_then(|r| r.error_description.or(r.error))
                .unwrap_or(body);
            return Err(Error::Auth(format!("token endpoint returned {}: {}", status, reason)));
        }

        let response: TokenResponse = serde_json::from_str(&body)?;
        let record = merge_token_response(&grant, response)?;
        self.store.persist(&record).await?;
        Ok(record)
    }
}

/// Builds the record to persist from a token endpoint answer.
///
/// A refresh answer may omit `refresh_token`; the one used for the request is
/// kept. Anything without both tokens is rejected.
pub fn merge_token_response(grant: &Grant, response: TokenResponse) -> Res<TokenRecord> {
    let refresh_token = match grant {
        Grant::RefreshToken(original) => original.clone(),
        Grant::AuthorizationCode { .. } => response.refresh_token.unwrap_or_default(),
    };
    let access_token = response.access_token.unwrap_or_default();

    if access_token.is_empty() || refresh_token.is_empty() {
        let reason = response
            .error_description
            .or(response.error)
            .unwrap_or_else(|| "response did not contain both access and refresh tokens".to_string());
        return Err(Error::Auth(reason));
    }

    Ok(TokenRecord {
        access_token,
        token_type: response.token_type.unwrap_or_default(),
        expires_in: response.expires_in.unwrap_or_default(),
        refresh_token,
        scope: response.scope.unwrap_or_default(),
    })
}
