pub mod db;
pub mod doctor;
pub mod env;
pub mod up;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use devboot_core::config::DevbootConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devboot",
    version,
    about = "Bootstrap the local dev environment (env files, database, seed) and run frontend + backend"
)]
pub struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install, prepare env files and database, then run the dev servers (default)
    Up(UpArgs),
    /// Create missing env files from their templates
    Env,
    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Check tooling, env files and database state
    Doctor,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Default)]
pub struct UpArgs {
    /// Reset an existing database without asking
    #[arg(long)]
    pub yes: bool,
    /// Never prompt; keep an existing database as is
    #[arg(long, conflicts_with = "yes")]
    pub no_prompt: bool,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Delete the database, then push the schema and seed
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Push the schema and seed without deleting anything
    Setup,
}

/// Load config for `--root`, or the current directory.
fn load_config(root: Option<PathBuf>) -> Result<DevbootConfig> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("Project root {} not found", root.display()))?;
    DevbootConfig::load(&root)
}

pub fn run(cli: Cli) -> Result<()> {
    let root = cli.root;
    match cli.command.unwrap_or(Commands::Up(UpArgs::default())) {
        Commands::Up(args) => up::run(load_config(root)?, &args),
        Commands::Env => env::run(&load_config(root)?),
        Commands::Db { command } => {
            let config = load_config(root)?;
            match command {
                DbCommands::Reset { yes } => db::reset(&config, yes),
                DbCommands::Setup => db::setup(&config),
            }
        }
        Commands::Doctor => doctor::run(&load_config(root)?),
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "devboot", &mut std::io::stdout());
            Ok(())
        }
    }
}
