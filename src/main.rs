//! # Medi-Insight CLI (`medi`)
//!
//! The `medi` binary drives the whole workflow: seeding a sample corpus,
//! building the vector index, serving the question-answering API, and the
//! interactive terminal chat.
//!
//! ## Usage
//!
//! ```bash
//! medi --config ./medi.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `medi seed` | Write the four sample patient reports into the data directory |
//! | `medi ingest` | Extract, chunk, and embed every PDF into a fresh index |
//! | `medi serve` | Start the HTTP API |
//! | `medi chat` | Interactive terminal chat against a running API |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use medi_insight::{chat, config, ingest, report, server};

/// Medi-Insight CLI: question answering over a local corpus of medical
/// PDF reports.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; every setting has a sensible default, so the file is optional.
#[derive(Parser)]
#[command(
    name = "medi",
    about = "Medi-Insight: retrieval-augmented question answering over medical PDF reports",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./medi.toml`. Data directory, index path, chunking,
    /// embedding, LLM, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./medi.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the sample patient reports.
    ///
    /// Writes four synthetic genomic profiling reports into the data
    /// directory. Existing files are left alone, so re-running is safe.
    Seed,

    /// Build the vector index from the PDF corpus.
    ///
    /// Extracts text page by page, splits it into overlapping chunks,
    /// embeds every chunk, and writes a fresh index. The previous index is
    /// only replaced once all embeddings are in hand.
    Ingest {
        /// Ingest this file or directory instead of the configured data path.
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Start the HTTP API.
    ///
    /// Serves `GET /` (health) and `POST /chat`. The retrieval engine is
    /// built before the listener opens; without an index the server still
    /// starts and answers `503 not_ready` on `/chat`.
    Serve,

    /// Interactive terminal chat.
    ///
    /// Connects to a running `medi serve` instance. Supports scoping
    /// questions to a single document and rebuilding the index in place.
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Seed => {
            let created = report::run_seed(&cfg)?;
            println!(
                "seed complete: {} new report(s) in {}",
                created.len(),
                cfg.data.path.display()
            );
        }
        Commands::Ingest { path } => {
            ingest::run_ingest(&cfg, path.as_deref()).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
    }

    Ok(())
}
