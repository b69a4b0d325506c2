//! Tabset CLI
//!
//! Preview tabbed settings pages from TOML or YAML definition files.
//!
//! Usage:
//!   tabset render settings.toml --tab advanced
//!   tabset render settings.toml --user "edit posts"
//!   tabset menu settings.toml tools.yaml
//!   tabset nonce settings.toml --tab general

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tabset_kernel::cli;
use tabset_kernel::config::Config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a page as HTML.
    Render {
        /// Page definition file (.toml, .yaml or .yml).
        file: PathBuf,

        /// Tab to select.
        #[arg(long)]
        tab: Option<String>,

        /// Capabilities of the previewing user, comma separated, or
        /// `anonymous`. Defaults to the page's capability.
        #[arg(long)]
        user: Option<String>,
    },

    /// Print the admin menu tree built from one or more definitions.
    Menu {
        /// Page definition files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the nonce action and a token for a tab.
    Nonce {
        /// Page definition file.
        file: PathBuf,

        /// Tab the token is scoped to.
        #[arg(long)]
        tab: String,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        nonce_lifetime_secs = config.nonce_lifetime_secs,
        "Configuration loaded"
    );

    match args.command {
        Command::Render { file, tab, user } => {
            cli::cmd_render(&config, &file, tab.as_deref(), user.as_deref())
        }
        Command::Menu { files } => cli::cmd_menu(&config, &files),
        Command::Nonce { file, tab } => cli::cmd_nonce(&config, &file, &tab),
    }
}

/// Logs go to stderr so rendered output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
