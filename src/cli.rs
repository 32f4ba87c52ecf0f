// src/cli.rs
//! CLI definitions for centaur
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "centaur")]
#[command(author = "Centaur Contributors")]
#[command(version)]
#[command(about = "Packaging automation: fetch, bump, build and upload", long_about = None)]
pub struct Cli {
    /// Data root holding configs, sources, specs and packages
    #[arg(short, long, global = true)]
    pub basedir: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Packages an action runs against
#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    /// Package names (configuration file stems)
    #[arg(required_unless_present = "all")]
    pub packages: Vec<String>,

    /// Run against every configured package
    #[arg(short, long, conflicts_with = "packages")]
    pub all: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch upstream sources
    Get(PackageArgs),

    /// Update existing working copies
    Update(PackageArgs),

    /// Discard working copies and fetch them again
    Refresh(PackageArgs),

    /// Export source archives and stage them next to the description
    Prepare(PackageArgs),

    /// Bump version and release in the package description
    Construct(PackageArgs),

    /// Build packages with the configured builder
    Build(PackageArgs),

    /// Copy built packages to the package directory
    Export(PackageArgs),

    /// Submit source packages to the remote build service
    Upload(PackageArgs),

    /// Remove working copies and exported archives
    Clean(PackageArgs),

    /// Show package status
    Status(PackageArgs),

    /// Check package configuration and required tools
    Verify(PackageArgs),

    /// Run get/update, construct, build, export and upload in order
    Chain(PackageArgs),

    /// List configured packages
    List,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
