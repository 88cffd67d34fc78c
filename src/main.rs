use std::{path::PathBuf, time::Duration};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use spotify_term::{
    Res, cli,
    config::{self, ConfigStore, Endpoints, StoragePaths},
    error,
    management::TokenStore,
    spotify::{
        auth::{AuthorizationFlow, TokenProvider},
        player::PlayerClient,
    },
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
  after_help="spotify-term keeps two files in your home directory: \".spotify-term.config\" and \".spotify-term\". Delete them to force a reconfiguration.",
)]
struct Cli {
    /// Directory holding the config and token files (defaults to home)
    #[clap(long, global = true, env = "SPOTIFY_TERM_HOME")]
    home: Option<PathBuf>,

    /// Log requests and token exchanges to stderr
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Perform first time setup
    Setup,

    /// Authorize the application on Spotify
    Login(LoginOptions),

    /// Resume the current track
    Resume,

    /// Pause the current track
    Pause,

    /// Skip to the next track
    Next,

    /// Skip to the previous track
    Previous,

    /// Show the track that is currently playing
    NowPlaying,

    /// Show the currently connected devices
    Devices,

    /// Print the profile of the current user
    Me,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOptions {
    /// Run the browser authorization even when a token is stored
    #[clap(long)]
    force: bool,

    /// Print the authorization link without opening a browser
    #[clap(long)]
    no_browser: bool,

    /// Seconds to wait for the browser authorization to complete
    #[clap(long, default_value_t = 180)]
    timeout: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("spotify_term=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let paths = match cli.home.clone() {
        Some(dir) => StoragePaths::in_dir(dir),
        None => match StoragePaths::from_home() {
            Ok(paths) => paths,
            Err(e) => error!("{}", e),
        },
    };

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let (label, result) = run(cli.command, &paths).await;
    if let Err(e) = result {
        error!("{} failed: {}", label, e);
    }
}

async fn run(command: Command, paths: &StoragePaths) -> (&'static str, Res<()>) {
    let config_store = ConfigStore::new(paths.config_file());

    if let Command::Setup = command {
        return ("Setup", cli::setup(&config_store).await);
    }

    let config = match config_store.load_or_create_config().await {
        Ok(config) => config,
        Err(e) => return ("Loading configuration", Err(e)),
    };

    let endpoints = Endpoints::from_env();
    let mut flow = AuthorizationFlow::new(endpoints.clone());
    if let Command::Login(opt) = &command {
        if opt.no_browser {
            flow = flow.without_browser();
        }
        flow = flow.with_timeout(Duration::from_secs(opt.timeout));
    }

    let provider = TokenProvider::new(
        config,
        TokenStore::new(paths.token_file()),
        endpoints.clone(),
        flow,
    );
    let session = cli::Session::new(provider, PlayerClient::new(endpoints));

    match command {
        Command::Login(opt) => ("Login", cli::login(&session, opt.force).await),
        Command::Resume => ("Resume", cli::resume(&session).await),
        Command::Pause => ("Pause", cli::pause(&session).await),
        Command::Next => ("Skip to next track", cli::next(&session).await),
        Command::Previous => ("Skip to previous track", cli::previous(&session).await),
        Command::NowPlaying => ("Now playing", cli::now_playing(&session).await),
        Command::Devices => ("Devices", cli::devices(&session).await),
        Command::Me => ("Profile", cli::me(&session).await),
        Command::Setup | Command::Completions(_) => ("", Ok(())),
    }
}
