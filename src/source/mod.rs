// src/source/mod.rs

//! Upstream sources
//!
//! A [`Source`] answers "where is the upstream code and what state is it
//! in" for one package. The variant set is closed:
//!
//! - `git` / `bzr`: a VCS working copy, versioned by revision
//! - `local`: a directory or file on this machine
//! - `url`: a single downloaded release archive
//! - `none`: no upstream code at all (description-only packages)
//!
//! Every variant keeps its files below `<datadir>/<package>/`, which is
//! unique per package name.

mod archive;
mod bzr;
mod git;
mod local;
mod none;
mod url;

pub use archive::{ArchiveFormat, write_tar_stream, write_tree};
pub use bzr::{BzrConfig, BzrSource};
pub use git::{GitConfig, GitSource};
pub use local::{LocalConfig, LocalSource};
pub use none::NoSource;
pub use url::{UrlConfig, UrlSource};

use crate::error::{Error, Result};
use crate::state::StateFile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a get/update/refresh call did to the working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    /// A working copy was materialised
    Created,
    /// `get` found an existing working copy and left it alone
    AlreadyExists,
    /// Nothing new upstream, or nothing to update
    Unchanged,
    /// New upstream revisions were pulled in
    Changed,
}

impl SourceOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already exists",
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
        }
    }
}

/// `[source]` section of a package file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSection {
    #[serde(flatten)]
    pub kind: SourceConfig,

    /// Keep the working copy and reuse exported archives
    #[serde(default = "default_keep")]
    pub keep: bool,

    /// Compression of exported archives
    #[serde(default)]
    pub format: ArchiveFormat,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceConfig::None,
            keep: default_keep(),
            format: ArchiveFormat::default(),
        }
    }
}

fn default_keep() -> bool {
    true
}

/// Variant-specific source settings, selected by `type`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Git(GitConfig),
    Bzr(BzrConfig),
    Local(LocalConfig),
    Url(UrlConfig),
    #[default]
    None,
}

/// Package-level facts every source variant needs
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Package name
    pub name: String,
    /// Upstream base version from the package file
    pub version: String,
    /// `<datadir>/<name>`
    pub dir: PathBuf,
    pub keep: bool,
    pub format: ArchiveFormat,
    pub state: StateFile,
    /// Package description, read by sources that take their version from it
    pub description: PathBuf,
}

impl SourceContext {
    /// Where a VCS or local working copy lives
    pub fn work_dir(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Top directory inside exported archives
    pub fn archive_prefix(&self, version: &str) -> String {
        format!("{}-{}", self.name, version)
    }

    /// Deterministic export location for `version`
    pub fn archive_path(&self, version: &str) -> PathBuf {
        self.dir.join(format!(
            "{}.{}",
            self.archive_prefix(version),
            self.format.extension()
        ))
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Whether an existing archive may be handed out instead of re-exporting
    pub fn reusable_archive(&self, version: &str, work_dir_present: bool) -> Option<PathBuf> {
        let path = self.archive_path(version);
        if path.exists() && (self.keep || !work_dir_present) {
            debug!("Reusing exported archive {}", path.display());
            Some(path)
        } else {
            None
        }
    }

    /// Remove every archive previously exported for this package
    pub fn remove_exports(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }

        let prefix = format!("{}-", self.name);
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(file) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let is_export = file.starts_with(&prefix)
                && (file.ends_with(ArchiveFormat::TarGz.extension())
                    || file.ends_with(ArchiveFormat::TarXz.extension()));
            if is_export && path.is_file() {
                debug!("Removing {}", path.display());
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Remove a working copy directory or file if present
pub(crate) fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        info!("Removing {}", path.display());
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        info!("Removing {}", path.display());
        fs::remove_file(path)?;
    }
    Ok(())
}

pub(crate) fn require_orig(kind: &str, orig: &str) -> Result<()> {
    if orig.trim().is_empty() {
        return Err(Error::ConfigurationError(format!(
            "{} source requires a non-empty 'orig'",
            kind
        )));
    }
    Ok(())
}

/// Upstream source of one package
#[derive(Debug, Clone)]
pub enum Source {
    Git(GitSource),
    Bzr(BzrSource),
    Local(LocalSource),
    Url(UrlSource),
    None(NoSource),
}

macro_rules! dispatch {
    ($self:ident, $src:ident => $body:expr) => {
        match $self {
            Source::Git($src) => $body,
            Source::Bzr($src) => $body,
            Source::Local($src) => $body,
            Source::Url($src) => $body,
            Source::None($src) => $body,
        }
    };
}

impl Source {
    /// Instantiate the configured variant
    pub fn new(config: &SourceConfig, ctx: SourceContext) -> Result<Self> {
        Ok(match config {
            SourceConfig::Git(c) => Self::Git(GitSource::new(c.clone(), ctx)?),
            SourceConfig::Bzr(c) => Self::Bzr(BzrSource::new(c.clone(), ctx)?),
            SourceConfig::Local(c) => Self::Local(LocalSource::new(c.clone(), ctx)?),
            SourceConfig::Url(c) => Self::Url(UrlSource::new(c.clone(), ctx)?),
            SourceConfig::None => Self::None(NoSource::new(ctx)),
        })
    }

    /// Variant tag as written in package files
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Git(_) => "git",
            Self::Bzr(_) => "bzr",
            Self::Local(_) => "local",
            Self::Url(_) => "url",
            Self::None(_) => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None(_))
    }

    pub fn context(&self) -> &SourceContext {
        dispatch!(self, s => s.context())
    }

    /// Configured upstream location
    pub fn origin(&self) -> Option<&str> {
        dispatch!(self, s => s.origin())
    }

    /// Path of the local working copy (directory or downloaded file)
    pub fn working_copy(&self) -> PathBuf {
        dispatch!(self, s => s.working_copy())
    }

    pub fn working_copy_exists(&self) -> bool {
        self.working_copy().exists()
    }

    /// Materialise the working copy
    pub fn get(&self) -> Result<SourceOutcome> {
        dispatch!(self, s => s.get())
    }

    /// Bring an existing working copy up to date
    pub fn update(&self) -> Result<SourceOutcome> {
        dispatch!(self, s => s.update())
    }

    /// Drop the working copy and fetch it again
    pub fn refresh(&self) -> Result<SourceOutcome> {
        info!("Refreshing {} source of {}", self.kind(), self.context().name);
        remove_path(&self.working_copy())?;
        self.get()
    }

    /// Remove working copy and exported archives unless `keep` is set
    pub fn clean(&self) -> Result<()> {
        let ctx = self.context();
        if ctx.keep {
            debug!("Keeping sources of {}", ctx.name);
            return Ok(());
        }
        remove_path(&self.working_copy())?;
        ctx.remove_exports()
    }

    /// Produce the source archive for the current state
    ///
    /// Returns `None` for sources that have nothing to archive.
    pub fn export(&self) -> Result<Option<PathBuf>> {
        dispatch!(self, s => s.export())
    }

    /// Canonical version of the current state
    pub fn formatver(&self) -> Result<String> {
        dispatch!(self, s => s.formatver())
    }

    /// Revision identity, if the variant has one
    pub fn rev(&self) -> Option<String> {
        dispatch!(self, s => s.rev())
    }

    /// Commit date (`YYMMDD.HHMMSS`), if the variant has one
    pub fn date(&self) -> Option<String> {
        dispatch!(self, s => s.date())
    }

    /// Check configuration and tool availability
    pub fn verify(&self) -> Result<()> {
        dispatch!(self, s => s.verify())
    }
}
