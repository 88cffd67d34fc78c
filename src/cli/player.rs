use crate::{
    Res,
    cli::Session,
    info,
    spotify::auth::Authorize,
    success,
    types::{CurrentlyPlaying, Device},
};

pub const NO_DEVICES_MESSAGE: &str = "There are no available devices at the moment.";
pub const NOTHING_PLAYING_MESSAGE: &str = "Nothing is playing right now.";

/// Resumes playback and prints the track that is now playing.
///
/// # Arguments
///
/// * `session` - Token provider and player client for this invocation
///
/// # Errors
///
/// Token errors (including a failed first-run authorization) and
/// [`crate::Error::Api`] answers are returned to the caller, which prints
/// them and exits.
///
/// # Example
///
/// ```
/// let session = Session::new(provider, PlayerClient::new(endpoints));
/// cli::resume(&session).await?;
/// ```
pub async fn resume<A: Authorize>(session: &Session<A>) -> Res<()> {
    let token = session.access_token().await?;
    session.player().resume(&token).await?;
    now_playing(session).await
}

/// Pauses playback and confirms with "Track paused.".
pub async fn pause<A: Authorize>(session: &Session<A>) -> Res<()> {
    let token = session.access_token().await?;
    session.player().pause(&token).await?;
    success!("Track paused.");
    Ok(())
}

/// Skips forward, waits for the player to settle, then prints the new track.
///
/// # Errors
///
/// Same as [`resume`]. The now-playing query is only sent when the skip
/// succeeded.
pub async fn next<A: Authorize>(session: &Session<A>) -> Res<()> {
    let token = session.access_token().await?;
    session.player().next(&token).await?;
    session.player().settle().await;
    now_playing(session).await
}

/// Skips back, waits for the player to settle, then prints the new track.
pub async fn previous<A: Authorize>(session: &Session<A>) -> Res<()> {
    let token = session.access_token().await?;
    session.player().previous(&token).await?;
    session.player().settle().await;
    now_playing(session).await
}

/// Prints one line about the current track, or that nothing is playing.
pub async fn now_playing<A: Authorize>(session: &Session<A>) -> Res<()> {
    let token = session.access_token().await?;
    let playing = session.player().currently_playing(&token).await?;
    info!("{}", now_playing_line(playing.as_ref()));
    Ok(())
}

/// Lists the user's devices, one line each.
///
/// An empty list prints [`NO_DEVICES_MESSAGE`] instead of failing.
pub async fn devices<A: Authorize>(session: &Session<A>) -> Res<()> {
    let token = session.access_token().await?;
    let devices = session.player().devices(&token).await?;
    for line in device_lines(&devices) {
        info!("{}", line);
    }
    Ok(())
}

/// Prints the raw profile JSON of the current user to stdout.
pub async fn me<A: Authorize>(session: &Session<A>) -> Res<()> {
    let token = session.access_token().await?;
    let profile = session.player().me(&token).await?;
    println!("{}", profile);
    Ok(())
}

/// `Now playing: <track> by <first artist>`.
pub fn now_playing_line(playing: Option<&CurrentlyPlaying>) -> String {
    let Some(item) = playing.and_then(|p| p.item.as_ref()) else {
        return NOTHING_PLAYING_MESSAGE.to_string();
    };

    match item.artists.first() {
        Some(artist) => format!("Now playing: {} by {}", item.name, artist.name),
        None => format!("Now playing: {}", item.name),
    }
}

/// One line per device (name, type, volume, id), or the no-devices message.
pub fn device_lines(devices: &[Device]) -> Vec<String> {
    if devices.is_empty() {
        return vec![NO_DEVICES_MESSAGE.to_string()];
    }

    devices
        .iter()
        .map(|device| {
            let volume = device
                .volume_percent
                .map(|v| format!("{}%", v))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{}  {}  {}  {}",
                device.name,
                device.kind,
                volume,
                device.id.as_deref().unwrap_or("-")
            )
        })
        .collect()
}
