//! Jukugo CLI - Command line interface for the kanji compound graph

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use jukugo_service::{LevelSource, StaticLevelSource, TsvLevelSource};
use jukugo_storage::{GraphStore, MemoryStorage};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{completions, graph, import, query, serve};
use config::{Backend, Config};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "jukugo")]
#[command(author, version, about = "Kanji compound-word graph builder")]
pub struct Cli {
    /// Data directory (overrides config and JUKUGO_DATA_DIR)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub backend: Option<Backend>,

    /// Output format: table, json, csv
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }

    /// Config file and environment, with this invocation's flags on top
    pub fn config(&self) -> Config {
        let mut config = Config::load();
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import compound words for one level
    Import(import::ImportArgs),
    /// List compounds containing a kanji
    Compounds(query::CompoundsArgs),
    /// Check a kanji's position in a compound
    Validate(query::ValidateArgs),
    /// Pick a random kanji with distractors
    Random(query::RandomArgs),
    /// Show node and edge counts
    Stats,
    /// Delete the whole graph
    Wipe(graph::WipeArgs),
    /// Start MCP server
    Serve(serve::ServeArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with storage backend
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn GraphStore>,
}

impl AppContext {
    pub async fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config = cli.config();
        let store = open_store(&config)?;
        Ok(Self { config, store })
    }

    /// Level source from the configured TSV file, if any
    pub fn levels(&self, path: Option<&PathBuf>) -> Option<Arc<dyn LevelSource>> {
        path.or(self.config.levels_path.as_ref())
            .map(|p| Arc::new(TsvLevelSource::new(p.clone())) as Arc<dyn LevelSource>)
    }

    /// Level source for servers, which start without one if none is configured
    pub fn levels_or_empty(&self, path: Option<&PathBuf>) -> Arc<dyn LevelSource> {
        self.levels(path).unwrap_or_else(|| {
            tracing::warn!("No levels file configured; imports will find no characters");
            Arc::new(StaticLevelSource::default())
        })
    }
}

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn GraphStore>> {
    if config.backend == Backend::Memory {
        tracing::debug!("Using in-memory graph");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    std::fs::create_dir_all(&config.data_dir)?;

    match config.backend {
        #[cfg(feature = "redb")]
        Backend::Redb => {
            let db_path = config.data_dir.join("jukugo.redb");
            tracing::debug!("Using database at: {:?}", db_path);
            Ok(Arc::new(jukugo_storage::RedbStorage::open(&db_path)?))
        }
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => {
            let db_path = config.data_dir.join("jukugo.sqlite3");
            tracing::debug!("Using database at: {:?}", db_path);
            Ok(Arc::new(jukugo_storage::SqliteStorage::open(&db_path)?))
        }
        other => anyhow::bail!("This build of jukugo has no {} backend", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries command output and JSON-RPC; logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting jukugo CLI");

    // Commands that never touch the graph
    match &cli.command {
        Commands::Config(args) => return commands::config::run(args).await,
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let ctx = AppContext::new(&cli).await?;

    match &cli.command {
        Commands::Import(args) => import::run(args, &cli, &ctx).await?,
        Commands::Compounds(args) => query::run_compounds(args, &cli, &ctx).await?,
        Commands::Validate(args) => query::run_validate(args, &cli, &ctx).await?,
        Commands::Random(args) => query::run_random(args, &cli, &ctx).await?,
        Commands::Stats => graph::run_stats(&cli, &ctx).await?,
        Commands::Wipe(args) => graph::run_wipe(args, &ctx).await?,
        Commands::Serve(args) => serve::run(args, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    Ok(())
}
