//! emend: compute and apply corrections between an original document and
//! an independently edited copy.
//!
//! # Startup sequence
//!
//! 1. Install the `tracing` subscriber (stderr, filter from `EMEND_LOG`).
//! 2. Parse arguments.
//! 3. Load `[engine]` settings from the XDG config file. Config errors are
//!    soft failures: logged, then defaults are used.
//! 4. Run the subcommand. `apply` exits non-zero if any correction failed.

mod commands;
mod document;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use emend_core::EngineConfig;

#[derive(Parser)]
#[command(name = "emend")]
#[command(about = "Turn an edited copy of a document into reviewable, appliable corrections")]
#[command(version)]
struct Cli {
    /// Engine config file (overrides the XDG default)
    #[arg(long, global = true, env = "EMEND_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the corrections for a document as JSON
    Corrections {
        /// JSON array of paragraph records, or an object with a `paragraphs` array
        document: PathBuf,
    },

    /// Review every correction and write the resulting paragraphs as JSON
    Apply {
        document: PathBuf,

        /// Reject everything instead of applying it
        #[arg(long)]
        reject_all: bool,

        /// Review journal database
        #[arg(long, default_value = ".emend/reviews.db")]
        journal: PathBuf,

        /// Do not record the review
        #[arg(long, conflicts_with = "journal")]
        no_journal: bool,

        /// Where to write the resulting paragraphs (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Returns the path to the emend config file.
///
/// Prefers `$XDG_CONFIG_HOME/emend/config.toml`; falls back to
/// `~/.config/emend/config.toml` when the env var is absent.
fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("emend").join("config.toml")
}

/// Loads engine settings. Never fails: errors are logged and defaults used.
fn load_config(explicit: Option<&Path>) -> EngineConfig {
    let path = explicit.map(Path::to_path_buf).unwrap_or_else(config_path);
    match EngineConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "config error, using defaults");
            EngineConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("EMEND_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Command::Corrections { document } => commands::corrections(&document, &config).await,
        Command::Apply {
            document,
            reject_all,
            journal,
            no_journal,
            output,
        } => {
            let options = commands::ApplyOptions {
                reject_all,
                journal: (!no_journal).then_some(journal),
                output,
            };
            let summary = commands::apply(&document, &config, &options).await?;
            if summary.failures > 0 {
                anyhow::bail!("{} correction(s) could not be applied", summary.failures);
            }
            Ok(())
        }
    }
}
