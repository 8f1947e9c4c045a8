//! gisting - GitHub Gists in the terminal
//!
//! Browse, edit and publish gists from a three-pane terminal interface.
//! New gists and files start as local drafts and are uploaded on publish.
//!
//! ## Usage
//!
//! ```bash
//! # Start with a token from the environment
//! GITHUB_TOKEN=ghp_... gisting
//!
//! # Log in once; the token is remembered
//! gisting --token ghp_...
//!
//! # With verbose logging
//! gisting -v
//!
//! # Forget the stored token
//! gisting logout
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gisting_core::config::default_config_dir;
use gisting_core::{Config, LogGuard, init_logging};
use gisting_remote::{GithubClient, HttpFetcher, RemoteConfig, RemoteError, resolve_token};
use gisting_store::LocalStore;
use gisting_sync::{AppContext, SyncEngine};
use gisting_tui::{App, SyncWorker, ThemeManager};
use tracing::{error, info, warn};

/// Browse, edit and publish GitHub Gists from the terminal.
///
/// New gists and files are kept as local drafts until published.
#[derive(Parser, Debug)]
#[command(name = "gisting")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to <config dir>/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Directory for config, local store and logs
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// GitHub personal access token with the gist scope
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API root
    #[arg(long, hide = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forget the stored access token
    Logout,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };

    // Initialize logging
    let _guard = match setup_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    if let Some(Command::Logout) = cli.command {
        return match config.clear_secrets() {
            Ok(()) => {
                info!("stored token cleared");
                println!("Logged out.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "failed to clear stored token");
                eprintln!("Error: {}", e);
                ExitCode::from(1)
            }
        };
    }

    // Install panic hook to ensure terminal cleanup
    install_panic_hook();

    info!("Starting gisting");

    match run_app(&cli, &mut config) {
        Ok(()) => {
            info!("gisting exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("gisting error: {:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => default_config_dir()?,
    };
    Config::load_or_init(&dir).with_context(|| format!("failed to load config from {}", dir.display()))
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    // Disable raw mode first
    let _ = crossterm::terminal::disable_raw_mode();

    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;

    stdout.flush()
}

/// Set up file logging; the console layer stays off under the TUI.
fn setup_logging(cli: &Cli, config: &Config) -> gisting_core::Result<LogGuard> {
    let log_dir = cli.log_dir.clone().unwrap_or_else(|| config.log_dir());
    init_logging(Some(log_dir), cli.verbose > 0, false)
}

fn remote_config(cli: &Cli) -> RemoteConfig {
    let mut remote = RemoteConfig::default();
    if let Some(url) = &cli.api_url {
        remote.api_base_url = url.trim_end_matches('/').to_string();
    }
    remote
}

/// Verify the token, then remember it if it came from the command line.
///
/// Returns the user's login.
fn authenticate(cli: &Cli, config: &mut Config, remote: &RemoteConfig) -> Result<(String, String)> {
    let token = resolve_token(cli.token.as_deref(), config).ok_or(RemoteError::Unauthenticated)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let (_, login) = runtime
        .block_on(GithubClient::authenticate(remote.clone(), token.as_str()))
        .map_err(|e| anyhow::anyhow!(e.friendly_message()).context("GitHub login failed"))?;

    if cli.token.is_some() && config.access_token != token {
        if let Err(e) = config.set_access_token(token.as_str()) {
            warn!(error = %e, "failed to store access token");
        }
    }
    Ok((token, login))
}

/// Wire the store, remote and worker together and run the TUI.
fn run_app(cli: &Cli, config: &mut Config) -> Result<()> {
    let remote_config = remote_config(cli);
    let (token, login) = authenticate(cli, config, &remote_config)?;

    let store_path = config.store_path();
    let store = LocalStore::open(&store_path)
        .with_context(|| format!("failed to open local store at {}", store_path.display()))?;

    // The worker builds its own runtime; clients are created fresh for it
    let client = GithubClient::new(remote_config.clone(), token)?;
    let fetcher = HttpFetcher::new(&remote_config)?;
    let context = AppContext::new(Arc::new(store), Arc::new(client), Arc::new(fetcher));
    let worker = SyncWorker::spawn(SyncEngine::new(context))?;

    let theme_manager = ThemeManager::from_config(config.clone());
    let mut app = App::new(worker, theme_manager).with_login(login);
    app.run()?;
    Ok(())
}
