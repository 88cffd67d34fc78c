//! # CLI Module
//!
//! Command implementations behind the `spotify-term` binary.
//!
//! ## Commands
//!
//! - [`setup`] - First-time configuration of client credentials
//! - [`login`] - Authorize the application and store tokens
//! - [`resume`], [`pause`], [`next`], [`previous`] - Playback control
//! - [`now_playing`] - Show the current track
//! - [`devices`] - List available playback devices
//! - [`me`] - Print the raw profile of the current user
//!
//! Every playback command fetches a fresh access token first, then issues a
//! single request. Errors are returned to the binary, which prints them and
//! exits; nothing is retried.

mod auth;
mod player;

pub use auth::{login, setup};
pub use player::{
    NO_DEVICES_MESSAGE, NOTHING_PLAYING_MESSAGE, device_lines, devices, me, next, now_playing,
    now_playing_line, pause, previous, resume,
};

use crate::{
    Res,
    spotify::{
        auth::{Authorize, TokenProvider},
        player::PlayerClient,
    },
};

/// Token provider and player client used by one command invocation.
pub struct Session<A> {
    provider: TokenProvider<A>,
    player: PlayerClient,
}

impl<A: Authorize> Session<A> {
    pub fn new(provider: TokenProvider<A>, player: PlayerClient) -> Self {
        Self { provider, player }
    }

    pub fn provider(&self) -> &TokenProvider<A> {
        &self.provider
    }

    pub fn player(&self) -> &PlayerClient {
        &self.player
    }

    async fn access_token(&self) -> Res<String> {
        self.provider.get_access_token().await
    }
}
