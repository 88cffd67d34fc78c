//! Configuration management for the Spotify terminal remote.
//!
//! Two kinds of configuration exist:
//! 1. Client credentials and the redirect port, stored as JSON in the user's
//!    home directory and created interactively on first run.
//! 2. Endpoint base URLs, which default to Spotify's public hosts and may be
//!    overridden through environment variables or an optional `.env` file in
//!    the local data directory.

use std::{
    env,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use crate::{Error, Res, utils};

pub use crate::types::Config;

pub const CONFIG_FILE_NAME: &str = ".spotify-term.config";
pub const TOKEN_FILE_NAME: &str = ".spotify-term";
pub const DEFAULT_REDIRECT_PORT: &str = "5958";

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

const ACCOUNTS_URL_VAR: &str = "SPOTIFY_TERM_ACCOUNTS_URL";
const API_URL_VAR: &str = "SPOTIFY_TERM_API_URL";

/// Loads endpoint overrides from `<data_local_dir>/spotify-term/.env`.
///
/// The file is optional. Variables already present in the environment win
/// over the file.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotify-term/.env`
/// - macOS: `~/Library/Application Support/spotify-term/.env`
/// - Windows: `%LOCALAPPDATA%/spotify-term/.env`
pub async fn load_env() -> Res<()> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotify-term");
    path.push(".env");

    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no .env override file");
        return Ok(());
    }

    dotenv::from_path(&path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "loaded .env override file");
    Ok(())
}

/// Location of the two persisted files.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    dir: PathBuf,
}

impl StoragePaths {
    /// Files directly in the user's home directory.
    pub fn from_home() -> Res<Self> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine the home directory".to_string()))?;
        Ok(Self { dir })
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    pub fn token_file(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE_NAME)
    }
}

/// Base URLs of the accounts service and the Web API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub accounts_url: String,
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn new(accounts_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            accounts_url: accounts_url.into(),
            api_url: api_url.into(),
        }
    }

    /// Defaults, overridden by `SPOTIFY_TERM_ACCOUNTS_URL` and
    /// `SPOTIFY_TERM_API_URL` when set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            accounts_url: env::var(ACCOUNTS_URL_VAR).unwrap_or(defaults.accounts_url),
            api_url: env::var(API_URL_VAR).unwrap_or(defaults.api_url),
        }
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.accounts_url.trim_end_matches('/'))
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_url.trim_end_matches('/'))
    }

    /// Full URL of a Web API path such as `/me/player/pause`.
    pub fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

impl Config {
    /// Redirect port as a number. Contents are only validated here, when
    /// the listener is about to bind.
    pub fn port(&self) -> Res<u16> {
        self.redirect_port.trim().parse::<u16>().map_err(|_| {
            Error::Config(format!(
                "redirect_port '{}' is not a valid port number",
                self.redirect_port
            ))
        })
    }

    pub fn redirect_uri(&self) -> String {
        utils::redirect_uri(self.redirect_port.trim())
    }
}

/// Reads and writes the JSON config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when the file is absent or empty.
    pub async fn load(&self) -> Res<Option<Config>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&content)?))
    }

    pub async fn persist(&self, config: &Config) -> Res<()> {
        let json = serde_json::to_string_pretty(config)?;
        utils::write_atomic(&self.path, json.as_bytes()).await
    }

    /// Returns the stored config, or prompts for one on stdin and stores it.
    ///
    /// The prompts block on the terminal, so they run on the blocking pool.
    pub async fn load_or_create_config(&self) -> Res<Config> {
        if let Some(config) = self.load().await? {
            return Ok(config);
        }

        let config = tokio::task::spawn_blocking(|| {
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            prompt_config(&mut stdin.lock(), &mut stdout)
        })
        .await
        .map_err(|e| Error::Config(format!("setup prompt did not complete: {}", e)))??;

        self.store_new(config, &mut std::io::stdout()).await
    }

    /// Same as [`ConfigStore::load_or_create_config`] with explicit streams.
    pub async fn load_or_create_with<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Res<Config> {
        if let Some(config) = self.load().await? {
            return Ok(config);
        }

        let config = prompt_config(input, output)?;
        self.store_new(config, output).await
    }

    async fn store_new<W: Write>(&self, config: Config, output: &mut W) -> Res<Config> {
        self.persist(&config).await?;
        tracing::debug!(path = %self.path.display(), "stored new configuration");

        writeln!(
            output,
            "The setup is done. Don't forget to add the following URI to your Spotify application's redirect URIs: {}",
            config.redirect_uri()
        )?;
        Ok(config)
    }
}

fn prompt_config<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Res<Config> {
    writeln!(
        output,
        "Welcome to spotify-term, we need to perform some first time setup."
    )?;
    writeln!(
        output,
        "Create a Spotify application at https://developer.spotify.com and enter its settings below."
    )?;

    let client_id = prompt(input, output, "Enter your client ID: ")?;
    let client_secret = prompt(input, output, "Enter your client secret: ")?;
    let port = prompt(
        input,
        output,
        &format!(
            "Enter the desired port for the authorization redirect [{}]: ",
            DEFAULT_REDIRECT_PORT
        ),
    )?;

    Ok(Config {
        client_id,
        client_secret,
        redirect_port: if port.is_empty() {
            DEFAULT_REDIRECT_PORT.to_string()
        } else {
            port
        },
    })
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Res<String> {
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(Error::Config(
            "input ended before setup was complete".to_string(),
        ));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
