// src/main.rs

use anyhow::Result;
use centaur::ActionKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let (kind, args) = match cli.command {
        Commands::Get(args) => (ActionKind::Get, args),
        Commands::Update(args) => (ActionKind::Update, args),
        Commands::Refresh(args) => (ActionKind::Refresh, args),
        Commands::Prepare(args) => (ActionKind::Prepare, args),
        Commands::Construct(args) => (ActionKind::Construct, args),
        Commands::Build(args) => (ActionKind::Build, args),
        Commands::Export(args) => (ActionKind::Export, args),
        Commands::Upload(args) => (ActionKind::Upload, args),
        Commands::Clean(args) => (ActionKind::Clean, args),
        Commands::Status(args) => (ActionKind::Status, args),
        Commands::Verify(args) => (ActionKind::Verify, args),
        Commands::Chain(args) => (ActionKind::Chain, args),
        Commands::List => {
            let config = commands::load_config(cli.config.as_deref(), cli.basedir)?;
            return commands::cmd_list(&config);
        }
        Commands::Completions { shell } => return commands::cmd_completions(shell),
    };

    let config = commands::load_config(cli.config.as_deref(), cli.basedir)?;
    commands::cmd_action(&config, kind, &args)
}
