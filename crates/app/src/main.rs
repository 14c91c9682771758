//! Lobby - chat for the games portal
//!
//! Runs either the reference message store or the terminal chat panel.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lobby_core::{Database, LobbyConfig, MemoryLog};
use lobby_net::{Server, StoreClient};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod panel;
mod state;

use state::AppState;

/// Lobby - polling chat client and reference store
#[derive(Parser)]
#[command(name = "lobby")]
#[command(about = "Chat panel for the games portal", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reference message store
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite file for the log
        #[arg(long)]
        db: Option<String>,

        /// Keep the log in memory only
        #[arg(long)]
        memory: bool,
    },

    /// Open the chat panel
    Chat {
        /// Store address
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Show or clear the saved display name
    Name {
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = match cli.config {
        Some(path) => {
            info!("Loading config from: {}", path);
            LobbyConfig::load_from(path)?
        }
        None => LobbyConfig::load()?,
    };

    match cli.command {
        Commands::Serve { port, db, memory } => serve(config, port, db, memory).await,
        Commands::Chat { addr } => {
            let addr = addr.unwrap_or_else(|| format!("127.0.0.1:{}", config.store.port));
            let client = StoreClient::new(addr, config.chat.request_timeout());
            let state = AppState::new(config)?;
            panel::run(state, client).await
        }
        Commands::Name { clear } => {
            let state = AppState::new(config)?;
            if clear {
                state.clear_name()?;
                println!("Name cleared");
            } else {
                match state.saved_name()? {
                    Some(name) => println!("{}", name),
                    None => println!("No name chosen yet"),
                }
            }
            Ok(())
        }
    }
}

async fn serve(
    mut config: LobbyConfig,
    port: Option<u16>,
    db: Option<String>,
    memory: bool,
) -> Result<()> {
    if let Some(port) = port {
        config.store.port = port;
    }
    if let Some(db) = db {
        config.store.database = Some(db.into());
    }
    config.store.in_memory |= memory;

    let server = if config.store.in_memory {
        info!("Keeping messages in memory");
        Server::start(config.store.port, MemoryLog::new(), &config.chat).await?
    } else {
        let path = match config.store.database {
            Some(path) => path,
            None => state::default_store_path()?,
        };
        info!(path = %path.display(), "Opening message log");
        Server::start(config.store.port, Database::open(&path)?, &config.chat).await?
    };

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    Ok(())
}
