//! Error taxonomy shared by the config store, the token provider and the
//! player commands.

use std::time::Duration;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or unusable configuration (bad redirect port, no home dir).
    #[error("configuration error: {0}")]
    Config(String),

    /// Authorization or refresh exchange failed or returned incomplete tokens.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// Transport-level failure talking to Spotify.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Stored file or response body was not the expected JSON.
    #[error("unexpected data: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading or writing a persisted file failed.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// A Web API endpoint answered with a non-2xx status.
    #[error("Spotify API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("authorization was not completed within {}s", .0.as_secs())]
    AuthorizationTimedOut(Duration),

    #[error("redirect callback did not include an authorization code")]
    MissingCode,

    #[error("authorization was denied: {0}")]
    AuthorizationDenied(String),

    #[error("redirect callback carried an unexpected state value")]
    StateMismatch,
}
