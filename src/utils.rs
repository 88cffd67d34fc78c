use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{Rng, distr::Alphanumeric};
use reqwest::Url;

use crate::{Error, Res};

/// Scopes requested during authorization.
pub const SCOPES: [&str; 3] = [
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-read-playback-state",
];

/// Random nonce sent as the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub fn redirect_uri(port: &str) -> String {
    format!("http://localhost:{}/callback", port)
}

/// Value of the `Authorization` header for the token endpoint.
pub fn basic_credentials(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", client_id, client_secret))
    )
}

/// Builds the provider's authorization URL with encoded query parameters.
pub fn build_authorize_url(
    authorize_endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Res<String> {
    let url = Url::parse_with_params(
        authorize_endpoint,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("scope", &SCOPES.join(" ")),
            ("state", state),
        ],
    )
    .map_err(|e| Error::Config(format!("invalid authorize endpoint: {}", e)))?;
    Ok(url.into())
}

/// Writes `contents` next to `path` and renames it into place.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Res<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            async_fs::create_dir_all(parent).await?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    async_fs::write(&tmp, contents).await?;
    async_fs::rename(&tmp, path).await?;
    Ok(())
}
