use crate::{
    Res,
    cli::Session,
    config::ConfigStore,
    info,
    spotify::auth::Authorize,
    success,
};

/// Creates the config file interactively, or reports the existing one.
pub async fn setup(store: &ConfigStore) -> Res<()> {
    if let Some(config) = store.load().await? {
        info!("Configuration already exists at {}", store.path().display());
        info!("Registered redirect URI must be: {}", config.redirect_uri());
        return Ok(());
    }

    store.load_or_create_config().await?;
    success!("Configuration saved to {}", store.path().display());
    Ok(())
}

/// Obtains tokens: refreshes a stored record, or runs the authorization flow
/// when none exists or `force` is set.
pub async fn login<A: Authorize>(session: &Session<A>, force: bool) -> Res<()> {
    let provider = session.provider();
    if force || provider.store().load().await?.is_none() {
        provider.login().await?;
    } else {
        provider.get_access_token().await?;
    }

    success!("Successfully logged in!");
    Ok(())
}
