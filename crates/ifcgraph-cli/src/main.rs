//! IFC Graph CLI
//!
//! Inspect IFC documents through the canonical node model:
//! - `root`: the document root as a normalized node
//! - `node`: any node by entity number or fragment path
//! - `search`: the per-type search index
//! - `lookup`: one search entry by entity number or `GlobalId`
//!
//! Output is JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use ifcgraph_session::{Session, SessionConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ifcgraph")]
#[command(author, version, about = "Inspect IFC and IFCX documents as one node graph")]
struct Cli {
    /// JSON session config (root type, size limit, display separator)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Entity type used as the root of STEP documents
    #[arg(long, global = true)]
    root_type: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Documents {
    /// One STEP file, or any number of IFCX documents composed together
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the root node.
    Root {
        #[command(flatten)]
        docs: Documents,
    },

    /// Print one node by id (`#12`, `12`, or a fragment path).
    Node {
        #[command(flatten)]
        docs: Documents,
        #[arg(long)]
        id: String,
    },

    /// Print the search index grouped by type.
    Search {
        #[command(flatten)]
        docs: Documents,
    },

    /// Print the type and search entry of one node.
    Lookup {
        file: PathBuf,
        #[arg(long, conflicts_with = "guid", required_unless_present = "guid")]
        id: Option<String>,
        #[arg(long)]
        guid: Option<String>,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(root_type) = &cli.root_type {
        config.root_type = root_type.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let mut session = Session::new(config);

    let output = match &cli.command {
        Commands::Root { docs } => commands::root(&mut session, &docs.files)?,
        Commands::Node { docs, id } => commands::node(&mut session, &docs.files, id)?,
        Commands::Search { docs } => commands::search(&mut session, &docs.files)?,
        Commands::Lookup { file, id, guid } => {
            commands::lookup(&mut session, file, id.as_deref(), guid.as_deref())?
        }
    };

    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(err) = run(cli) {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
