use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use henrymo_analysis::analysis::AnalysisKind;
use henrymo_analysis::cli::{analyze, history, scan, token};
use henrymo_analysis::config::Config;
use henrymo_analysis::server::{self, AppState};
use henrymo_analysis::store::HistoryStore;

#[derive(Parser)]
#[command(name = "henrymo")]
#[command(about = "AI-assisted code and error analysis service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "henrymo.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve,

    /// Scan a file for hardcoded credentials
    Scan {
        /// File to scan
        path: PathBuf,
    },

    /// Run an analysis from the command line and store it
    Analyze {
        /// Source file
        path: PathBuf,

        /// Source language
        #[arg(short, long)]
        language: String,

        /// Analysis kind (code, security, performance)
        #[arg(short, long, default_value = "code", value_parser = parse_kind)]
        kind: AnalysisKind,

        /// Owning user ID
        #[arg(short, long)]
        user: Uuid,
    },

    /// Mint a bearer token for a user
    Token {
        /// User ID
        user: Uuid,

        /// Token lifetime in hours
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },

    /// Browse stored analyses
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List analyses, newest first
    List {
        /// Owning user ID
        #[arg(short, long)]
        user: Uuid,
        /// Filter by analysis kind (code, security, performance)
        #[arg(short = 't', long = "type", value_parser = parse_kind)]
        kind: Option<AnalysisKind>,
        /// Filter by language
        #[arg(short, long)]
        language: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one analysis or debugging session
    Show {
        /// Record ID
        id: String,
        /// Owning user ID
        #[arg(short, long)]
        user: Uuid,
    },
    /// Count stored records per kind
    Stats {
        /// Owning user ID
        #[arg(short, long)]
        user: Uuid,
    },
}

fn parse_kind(value: &str) -> Result<AnalysisKind> {
    AnalysisKind::parse(value)
        .ok_or_else(|| anyhow!("unknown analysis kind '{}' (code, security, performance)", value))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("henrymo_analysis=info,tower_http=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Load config
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        tracing::warn!("{:#}; using defaults", e);
        Config::default()
    });

    match cli.command {
        Commands::Serve => {
            let state = AppState::from_config(&config)?;
            server::serve(&config, state).await?;
        }
        Commands::Scan { path } => {
            scan::run(&path)?;
        }
        Commands::Analyze {
            path,
            language,
            kind,
            user,
        } => {
            let store = Arc::new(HistoryStore::open(&config.database_path())?);
            analyze::run(&config, store, &path, language, kind, user).await?;
        }
        Commands::Token { user, ttl_hours } => {
            token::run(&config, user, ttl_hours)?;
        }
        Commands::History { command } => {
            let store = HistoryStore::open(&config.database_path())?;
            match command {
                HistoryCommands::List {
                    user,
                    kind,
                    language,
                    limit,
                    offset,
                } => {
                    history::list(&store, &user.to_string(), kind, language, limit, offset)?;
                }
                HistoryCommands::Show { id, user } => {
                    history::show(&store, &user.to_string(), &id)?;
                }
                HistoryCommands::Stats { user } => {
                    history::stats(&store, &user.to_string())?;
                }
            }
        }
    }

    Ok(())
}
