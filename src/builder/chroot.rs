// src/builder/chroot.rs

//! Chroot builds through a mock-compatible tool
//!
//! Two steps per build:
//!
//! 1. `<command> [-r <dist>] --buildsrpm --spec <description> --sources <dir> --resultdir <results>/srpm`
//! 2. `<command> -r <dist> --rebuild <srpm> --resultdir <results>/<dist>` for every dist
//!
//! Without configured dists the tool's default chroot is used.

use crate::error::{Error, Result};
use crate::process;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const DEFAULT_DIST_DIR: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChrootConfig {
    /// Build tool executable
    #[serde(default = "default_command")]
    pub command: String,

    /// Chroot configurations to build in, in order
    #[serde(default)]
    pub dists: Vec<String>,

    /// Copy artifacts to the package output directory on EXPORT
    #[serde(default = "default_export")]
    pub export: bool,
}

fn default_command() -> String {
    "mock".to_string()
}

fn default_export() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct ChrootBuilder {
    config: ChrootConfig,
    name: String,
    results: PathBuf,
    packages: PathBuf,
}

impl ChrootBuilder {
    pub fn new(config: ChrootConfig, name: &str, results: PathBuf, packages: PathBuf) -> Self {
        Self {
            config,
            name: name.to_string(),
            results,
            packages,
        }
    }

    fn srpm_dir(&self) -> PathBuf {
        self.results.join("srpm")
    }

    pub fn build(&self, description: &Path, archive: Option<&Path>) -> Result<Vec<PathBuf>> {
        if !description.exists() {
            return Err(Error::BuildFailure(format!(
                "description {} does not exist",
                description.display()
            )));
        }

        // results of earlier builds must not leak into this one
        if self.results.exists() {
            fs::remove_dir_all(&self.results)?;
        }
        fs::create_dir_all(self.srpm_dir())?;

        let sources = archive
            .and_then(Path::parent)
            .or_else(|| description.parent())
            .unwrap_or_else(|| Path::new("."));

        let mut cmd = process::command(&self.config.command, Vec::<&str>::new(), None);
        if let Some(dist) = self.config.dists.first() {
            cmd.args(["-r", dist]);
        }
        cmd.arg("--buildsrpm")
            .arg("--spec")
            .arg(description)
            .arg("--sources")
            .arg(sources)
            .arg("--resultdir")
            .arg(self.srpm_dir());

        info!("Building source package of {}", self.name);
        process::check(&mut cmd, Error::BuildFailure)?;

        let srpm = self
            .source_packages()?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::BuildFailure(format!(
                    "no source package found in {}",
                    self.srpm_dir().display()
                ))
            })?;

        let dists: Vec<Option<&str>> = if self.config.dists.is_empty() {
            vec![None]
        } else {
            self.config.dists.iter().map(|d| Some(d.as_str())).collect()
        };

        for dist in dists {
            let result_dir = self.results.join(dist.unwrap_or(DEFAULT_DIST_DIR));
            fs::create_dir_all(&result_dir)?;

            let mut cmd = process::command(&self.config.command, Vec::<&str>::new(), None);
            if let Some(dist) = dist {
                cmd.args(["-r", dist]);
            }
            cmd.arg("--rebuild")
                .arg(&srpm)
                .arg("--resultdir")
                .arg(&result_dir);

            info!(
                "Building {} in {}",
                self.name,
                dist.unwrap_or("the default chroot")
            );
            process::check(&mut cmd, Error::BuildFailure)?;
        }

        let artifacts = self.artifacts()?;
        info!("Build of {} produced {} package(s)", self.name, artifacts.len());
        Ok(artifacts)
    }

    /// Every `.rpm` below the results directory, sorted
    fn artifacts(&self) -> Result<Vec<PathBuf>> {
        rpms_below(&self.results, |_| true)
    }

    pub fn source_packages(&self) -> Result<Vec<PathBuf>> {
        rpms_below(&self.srpm_dir(), |name| name.ends_with(".src.rpm"))
    }

    pub fn export(&self) -> Result<Vec<PathBuf>> {
        if !self.config.export {
            info!("Export of {} build results is disabled", self.name);
            return Ok(Vec::new());
        }

        let artifacts = self.artifacts()?;
        if artifacts.is_empty() {
            warn!("No build results of {} to export", self.name);
            return Ok(Vec::new());
        }

        fs::create_dir_all(&self.packages)?;
        let mut exported = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let Some(file) = artifact.file_name() else {
                continue;
            };
            let dest = self.packages.join(file);
            fs::copy(&artifact, &dest)?;
            exported.push(dest);
        }

        info!(
            "Exported {} package(s) to {}",
            exported.len(),
            self.packages.display()
        );
        Ok(exported)
    }

    pub fn verify(&self) -> Result<()> {
        if !process::is_available(&self.config.command) {
            return Err(Error::ConfigurationError(format!(
                "build tool '{}' not found",
                self.config.command
            )));
        }
        Ok(())
    }
}

fn rpms_below<F>(dir: &Path, filter: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if entry.file_type().is_file() && name.ends_with(".rpm") && filter(name) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}
