//! Spotify terminal remote library.
//!
//! This library implements a small command-line remote for the Spotify Web API.
//! It covers the OAuth authorization-code handshake (with a local redirect
//! listener), persistence of client credentials and tokens, and a handful of
//! playback-control endpoints.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local redirect listener
//! - `cli` - Command implementations and output rendering
//! - `config` - Client credentials, storage paths and endpoint overrides
//! - `error` - Error taxonomy shared by every layer
//! - `management` - Token persistence
//! - `server` - Local HTTP listener scoped to a single authorization
//! - `spotify` - Authorization flow, token provider and player client
//! - `types` - Data contracts for persisted files and API responses
//! - `utils` - Helpers for URLs, credentials and nonces
//!
//! # Example
//!
//! ```
//! use spotify_term::{config::StoragePaths, management::TokenStore};
//!
//! #[tokio::main]
//! async fn main() -> spotify_term::Res<()> {
//!     let paths = StoragePaths::from_home()?;
//!     let store = TokenStore::new(paths.token_file());
//!     let _record = store.load().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::Error;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate reports one of the [`Error`]
/// variants, so callers at the command boundary can print a short context
/// line and abort the current command.
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Open this link to authorize the app: {}", url);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Successfully logged in!");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only the binary calls this, at the command boundary. Library code returns
/// [`Error`] values instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems, such as a browser that could not be
/// launched.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
