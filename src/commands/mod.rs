// src/commands/mod.rs
//! Command handlers for the centaur CLI

use crate::cli::{Cli, PackageArgs};
use anyhow::{Context, Result, bail};
use centaur::action::{self, ActionKind, ActionResult};
use centaur::{Config, Package};
use clap::CommandFactory;
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build the run's configuration from file, environment and flags
pub fn load_config(config: Option<&Path>, basedir: Option<PathBuf>) -> Result<Config> {
    let config = Config::load(config, basedir).context("Failed to load configuration")?;
    debug!("Data root: {}", config.basedir.display());
    Ok(config)
}

/// Package names selected on the command line
fn resolve_packages(config: &Config, args: &PackageArgs) -> Result<Vec<String>> {
    if !args.all {
        return Ok(args.packages.clone());
    }

    let names = config.package_names().with_context(|| {
        format!(
            "Failed to list packages in {}",
            config.conf_dir().display()
        )
    })?;
    if names.is_empty() {
        bail!("No packages configured in {}", config.conf_dir().display());
    }
    Ok(names)
}

/// Run one action against every selected package
///
/// Packages are processed in order; a failure does not stop the remaining
/// packages, but the command fails once all of them ran.
pub fn cmd_action(config: &Config, kind: ActionKind, args: &PackageArgs) -> Result<()> {
    let names = resolve_packages(config, args)?;
    let mut failed = Vec::new();

    for name in &names {
        let package = match Package::load(config, name) {
            Ok(p) => p,
            Err(e) => {
                println!("{}: {}", name, ActionResult::failure(kind, &e));
                failed.push(name.as_str());
                continue;
            }
        };

        let succeeded = match kind {
            ActionKind::Chain => run_chain(&package),
            ActionKind::Status => {
                let result = action::run(kind, &package);
                println!("{}", result.message);
                result.succeeded
            }
            _ => {
                let result = action::run(kind, &package);
                println!("{}: {}", name, result);
                result.succeeded
            }
        };

        if !succeeded {
            failed.push(name.as_str());
        }
    }

    if !failed.is_empty() {
        bail!(
            "{} failed for {} of {} package(s): {}",
            kind,
            failed.len(),
            names.len(),
            failed.join(", ")
        );
    }
    Ok(())
}

fn run_chain(package: &Package) -> bool {
    info!("CHAIN {}", package.id);
    let report = action::run_chain(package);
    for step in &report.steps {
        println!("{}: {}", package.id, step);
    }

    let result = report.into_result();
    println!("{}: {}", package.id, result);
    result.succeeded
}

/// List configured packages with their backends
pub fn cmd_list(config: &Config) -> Result<()> {
    let names = config.package_names().with_context(|| {
        format!(
            "Failed to list packages in {}",
            config.conf_dir().display()
        )
    })?;

    if names.is_empty() {
        println!("No packages configured in {}", config.conf_dir().display());
        return Ok(());
    }

    for name in names {
        match Package::load(config, &name) {
            Ok(p) => println!(
                "{:<24} source={} builder={} uploader={}",
                name,
                p.source.kind(),
                p.builder.kind(),
                p.uploader.kind()
            ),
            Err(e) => println!("{:<24} invalid: {}", name, e),
        }
    }
    Ok(())
}

pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "centaur", &mut std::io::stdout());
    Ok(())
}
