//! # hund
//!
//! Command-line front end for the hund package index service.

use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Password;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use hund_client::{
    Account, ApiClient, AppState, ClientConfig, CoreError, QueryFailure, QueryState,
    SearchOutcome,
};
use hund_shared::{Credentials, PkgResult};
use hund_store::SqliteSessionStore;

#[derive(Parser)]
#[command(name = "hund")]
#[command(about = "Search Nix package indices by file")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and log in
    Register {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List channels and their indices
    Channels,
    /// Search an index
    Search {
        /// Channel to search (default: first channel with an index)
        #[arg(long)]
        channel: Option<String>,
        /// Index id within the channel (default: its first index)
        #[arg(long)]
        index: Option<String>,
        /// Text to search for; empty lists everything
        #[arg(default_value = "")]
        text: String,
    },
    /// Build a new index for a channel
    Generate {
        #[arg(long)]
        channel: Option<String>,
    },
    /// Show the search history
    History,
    /// Delete one history entry of an index
    Forget { index_id: String },
    /// Delete the account and forget the session
    DeleteAccount,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,hund=info,hund_client=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    debug!(?config, "loaded configuration");

    let store = match &config.db_path {
        Some(path) => SqliteSessionStore::open_at(path),
        None => SqliteSessionStore::open_default(),
    }
    .context("failed to open session database")?;
    let account = Account::new(config, store)?;

    let result = run(cli.command, &account).await;
    if let Some(e) = result.as_ref().err().and_then(|e| e.downcast_ref::<CoreError>()) {
        if account.handle_failure(e)? {
            warn!("session expired, log in again");
        }
    }
    result
}

async fn run(command: Commands, account: &Account<SqliteSessionStore>) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let credentials = Credentials::new(username, password_or_prompt(password)?);
            account.login(&credentials).await?;
            println!("Logged in as {}", credentials.username);
        }
        Commands::Register { username, password } => {
            let credentials = Credentials::new(username, password_or_prompt(password)?);
            account.register(&credentials).await?;
            println!("Registered and logged in as {}", credentials.username);
        }
        Commands::Logout => {
            account.logout()?;
            println!("Logged out");
        }
        Commands::Whoami => match account.session()? {
            Some(session) if session.is_active() => println!("{}", session.username),
            _ => return Err(CoreError::NotLoggedIn.into()),
        },
        Commands::Channels => {
            let app = session_state(account)?;
            populate(&app).await?;
            print_channels(&app);
        }
        Commands::Search {
            channel,
            index,
            text,
        } => {
            let app = session_state(account)?;
            populate(&app).await?;
            if let Some(channel) = channel {
                app.select_channel(&channel)?;
            }
            if let Some(index) = index {
                app.select_index(&index)?;
            }
            match app.search(&text).await {
                SearchOutcome::Applied(QueryState::Results(results)) => print_results(&results),
                SearchOutcome::Applied(QueryState::Failed(QueryFailure::NoIndexSelected)) => {
                    return Err(CoreError::NoIndexSelected.into())
                }
                SearchOutcome::Applied(QueryState::Failed(QueryFailure::Api(e))) => {
                    return Err(CoreError::from(e).into())
                }
                other => debug!(?other, "search produced no results"),
            }
        }
        Commands::Generate { channel } => {
            let app = session_state(account)?;
            populate(&app).await?;
            if let Some(channel) = channel {
                app.select_channel(&channel)?;
            }
            println!("Generating index, this can take several minutes...");
            let generated = app.generate_index().await?;
            println!(
                "Index {} created: {} packages, {} files",
                generated.id, generated.total_package_count, generated.total_file_count
            );
        }
        Commands::History => {
            let app = session_state(account)?;
            for entry in app.history.refresh().await.map_err(CoreError::from)? {
                println!(
                    "{}  {:<24} {}  {}",
                    entry.date.format("%Y-%m-%d %H:%M"),
                    entry.pkg.pkg_name,
                    entry.pkg.version,
                    entry.index_id
                );
            }
        }
        Commands::Forget { index_id } => {
            let app = session_state(account)?;
            app.history.delete(&index_id).await.map_err(CoreError::from)?;
            println!("History of index {index_id} deleted");
        }
        Commands::DeleteAccount => {
            let api = account.restore()?.ok_or(CoreError::NotLoggedIn)?;
            account.delete_account(&api).await?;
            println!("Account deleted");
        }
    }
    Ok(())
}

fn session_state(account: &Account<SqliteSessionStore>) -> Result<AppState<ApiClient>, CoreError> {
    let api = account.restore()?.ok_or(CoreError::NotLoggedIn)?;
    Ok(AppState::new(Arc::new(api)))
}

async fn populate(app: &AppState<ApiClient>) -> Result<(), CoreError> {
    let report = app.populate().await?;
    if let Some(warning) = report.warning() {
        warn!("{warning}");
    }
    Ok(())
}

fn print_channels(app: &AppState<ApiClient>) {
    let state = app.catalog.snapshot();
    for entry in &state.channels {
        let marker = if state.current_channel_name() == Some(entry.name()) { "*" } else { " " };
        println!("{marker} {}", entry.name());
        for index in &entry.indices {
            let marker = if state.current_index_id() == Some(index.id.as_str()) { "*" } else { " " };
            println!(
                "    {marker} {}  {}  {} files",
                index.id,
                index.created_at.format("%Y-%m-%d %H:%M"),
                index.total_file_count
            );
        }
    }
}

fn print_results(results: &[PkgResult]) {
    if results.is_empty() {
        println!("No matches");
        return;
    }
    for pkg in results {
        println!("{}.{} {}  {}", pkg.pkg_name, pkg.out_name, pkg.version, pkg.path);
    }
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("failed to read password"),
    }
}
