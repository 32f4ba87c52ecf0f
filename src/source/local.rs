// src/source/local.rs

//! Sources copied from the local filesystem

use super::{SourceContext, SourceOutcome, remove_path, require_orig, write_tree};
use crate::error::{Error, Result};
use crate::spec::PackageDescription;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory or file to copy
    pub orig: String,
}

/// A directory tree or single file on this machine
///
/// The version is whatever the package description already declares; the
/// configured base version is used while the description still holds a
/// placeholder.
#[derive(Debug, Clone)]
pub struct LocalSource {
    config: LocalConfig,
    ctx: SourceContext,
}

impl LocalSource {
    pub fn new(config: LocalConfig, ctx: SourceContext) -> Result<Self> {
        require_orig("local", &config.orig)?;
        Ok(Self { config, ctx })
    }

    pub fn context(&self) -> &SourceContext {
        &self.ctx
    }

    pub fn origin(&self) -> Option<&str> {
        Some(&self.config.orig)
    }

    fn orig_path(&self) -> PathBuf {
        PathBuf::from(&self.config.orig)
    }

    pub fn working_copy(&self) -> PathBuf {
        let orig = self.orig_path();
        if orig.is_file() {
            let file = orig.file_name().map(PathBuf::from).unwrap_or_default();
            self.ctx.dir.join(file)
        } else {
            self.ctx.work_dir()
        }
    }

    pub fn get(&self) -> Result<SourceOutcome> {
        let dest = self.working_copy();
        if dest.exists() {
            info!("Sources of {} already present", self.ctx.name);
            return Ok(SourceOutcome::AlreadyExists);
        }

        let orig = self.orig_path();
        if !orig.exists() {
            return Err(Error::SourceUnavailable(format!(
                "{} does not exist",
                orig.display()
            )));
        }

        self.ctx.ensure_dir()?;
        if orig.is_file() {
            debug!("Copying {} to {}", orig.display(), dest.display());
            fs::copy(&orig, &dest)?;
        } else {
            copy_tree(&orig, &dest)?;
        }

        info!("Copied {} into {}", orig.display(), dest.display());
        Ok(SourceOutcome::Created)
    }

    pub fn update(&self) -> Result<SourceOutcome> {
        Ok(SourceOutcome::Unchanged)
    }

    pub fn export(&self) -> Result<Option<PathBuf>> {
        let src = self.working_copy();
        let present = src.exists();
        let version = self.formatver()?;
        if let Some(path) = self.ctx.reusable_archive(&version, present) {
            return Ok(Some(path));
        }
        if !present {
            return Err(Error::SourceUnavailable(format!(
                "sources of {} have not been fetched",
                self.ctx.name
            )));
        }

        let dest = self.ctx.archive_path(&version);
        write_tree(&src, &dest, &self.ctx.archive_prefix(&version), self.ctx.format)?;
        info!("Exported {}", dest.display());

        if !self.ctx.keep {
            remove_path(&src)?;
        }
        Ok(Some(dest))
    }

    pub fn formatver(&self) -> Result<String> {
        if self.ctx.description.exists() {
            if let Some(version) = PackageDescription::load(&self.ctx.description)?.version()? {
                return Ok(version);
            }
        }
        Ok(self.ctx.version.clone())
    }

    pub fn rev(&self) -> Option<String> {
        None
    }

    pub fn date(&self) -> Option<String> {
        None
    }

    pub fn verify(&self) -> Result<()> {
        if !Path::new(&self.config.orig).exists() {
            return Err(Error::ConfigurationError(format!(
                "local source {} does not exist",
                self.config.orig
            )));
        }
        Ok(())
    }
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::IoError(e.to_string()))?;
        let target = dest.join(rel);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            std::os::unix::fs::symlink(link, &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
