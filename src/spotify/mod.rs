//! # Spotify Integration Module
//!
//! The layer between the commands and Spotify's services.
//!
//! ```text
//! CLI commands
//!      ↓
//! TokenProvider ── AuthorizationFlow ── CallbackServer (first login only)
//!      ↓
//! PlayerClient
//!      ↓
//! accounts.spotify.com / api.spotify.com
//! ```
//!
//! ## Authentication
//!
//! [`auth`] implements the authorization-code grant with a client secret:
//! the user approves access in the browser, Spotify redirects to the local
//! listener with a one-time code, and the code is exchanged for an access and
//! refresh token pair. Later invocations use the stored refresh token and
//! never reopen the browser.
//!
//! ## Player
//!
//! [`player`] covers resume, pause, next, previous, currently playing,
//! devices and the user profile. Responses are decoded into narrow contracts
//! holding only the fields the commands print.

pub mod auth;
pub mod player;
