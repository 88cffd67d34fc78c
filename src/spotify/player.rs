use std::time::Duration;

use reqwest::{Client, Method, StatusCode, header::CONTENT_LENGTH};

use crate::{
    Error, Res,
    config::Endpoints,
    types::{CurrentlyPlaying, Device, DevicesResponse},
};

/// Pause between a skip and the follow-up now-playing query so the player
/// state has settled.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Narrow client for the player and profile endpoints.
///
/// Each call is a single request with no retry; a non-2xx answer becomes
/// [`Error::Api`].
#[derive(Debug, Clone)]
pub struct PlayerClient {
    http: Client,
    endpoints: Endpoints,
    settle_delay: Duration,
}

impl PlayerClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: Client::new(),
            endpoints,
            settle_delay: SETTLE_DELAY,
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sleeps for the settle delay.
    pub async fn settle(&self) {
        tokio::time::sleep(self.settle_delay).await;
    }

    /// Resumes playback on the active device (`PUT /me/player/play`).
    ///
    /// # Arguments
    ///
    /// * `token` - Access token carrying `user-modify-playback-state`
    ///
    /// # Errors
    ///
    /// - [`Error::Network`] when the request cannot be sent
    /// - [`Error::Api`] for any non-2xx answer, for example 404 when no device
    ///   is active or 403 for accounts without Premium
    ///
    /// # Example
    ///
    /// ```
    /// let player = PlayerClient::new(Endpoints::default());
    /// player.resume(&access_token).await?;
    /// ```
    pub async fn resume(&self, token: &str) -> Res<()> {
        self.send(Method::PUT, "/me/player/play", token).await?;
        Ok(())
    }

    /// Pauses playback on the active device (`PUT /me/player/pause`).
    ///
    /// # Errors
    ///
    /// Same as [`PlayerClient::resume`].
    pub async fn pause(&self, token: &str) -> Res<()> {
        self.send(Method::PUT, "/me/player/pause", token).await?;
        Ok(())
    }

    /// Skips to the next track (`POST /me/player/next`).
    ///
    /// The player reports the new track only after a short delay; call
    /// [`PlayerClient::settle`] before asking for it.
    ///
    /// # Errors
    ///
    /// Same as [`PlayerClient::resume`].
    pub async fn next(&self, token: &str) -> Res<()> {
        self.send(Method::POST, "/me/player/next", token).await?;
        Ok(())
    }

    /// Skips to the previous track (`POST /me/player/previous`).
    pub async fn previous(&self, token: &str) -> Res<()> {
        self.send(Method::POST, "/me/player/previous", token).await?;
        Ok(())
    }

    /// `None` when nothing is playing (204 or an empty body).
    pub async fn currently_playing(&self, token: &str) -> Res<Option<CurrentlyPlaying>> {
        let (status, body) = self
            .send(Method::GET, "/me/player/currently-playing", token)
            .await?;
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub async fn devices(&self, token: &str) -> Res<Vec<Device>> {
        let (_, body) = self.send(Method::GET, "/me/player/devices", token).await?;
        let response: DevicesResponse = serde_json::from_str(&body)?;
        Ok(response.devices)
    }

    /// Raw profile JSON of the current user.
    pub async fn me(&self, token: &str) -> Res<String> {
        let (_, body) = self.send(Method::GET, "/me", token).await?;
        Ok(body)
    }

    async fn send(&self, method: Method, path: &str, token: &str) -> Res<(StatusCode, String)> {
        let url = self.endpoints.api(path);
        tracing::debug!(%method, %url, "spotify api request");

        let mut request = self.http.request(method.clone(), &url).bearer_auth(token);
        if method != Method::GET {
            // Spotify rejects body-less PUT/POST without an explicit length.
            request = request.header(CONTENT_LENGTH, 0);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, %url, "spotify api response");

        if !status.is_success() {
            return Err(Error::Api { status, body });
        }
        Ok((status, body))
    }
}
