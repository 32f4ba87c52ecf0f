// src/builder/mod.rs

//! Package builders
//!
//! A builder turns a rewritten description plus its source archive into
//! installable artifacts, then copies them to the package's output
//! directory. The backend is an external tool; its exit status decides
//! success.

mod chroot;

pub use chroot::{ChrootBuilder, ChrootConfig};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[builder]` section of a package file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BuilderConfig {
    #[default]
    None,
    Chroot(ChrootConfig),
}

/// Builder of one package
#[derive(Debug, Clone)]
pub enum Builder {
    /// Building disabled; every operation succeeds without doing anything
    None,
    Chroot(ChrootBuilder),
}

impl Builder {
    /// `results` is where build output is collected, `packages` where
    /// EXPORT copies it to
    pub fn new(config: &BuilderConfig, name: &str, results: PathBuf, packages: PathBuf) -> Self {
        match config {
            BuilderConfig::None => Self::None,
            BuilderConfig::Chroot(c) => {
                Self::Chroot(ChrootBuilder::new(c.clone(), name, results, packages))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Chroot(_) => "chroot",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Build from `description` and, if the source produced one, `archive`
    pub fn build(&self, description: &Path, archive: Option<&Path>) -> Result<Vec<PathBuf>> {
        match self {
            Self::None => Ok(Vec::new()),
            Self::Chroot(b) => b.build(description, archive),
        }
    }

    /// Copy produced artifacts to the output directory
    pub fn export(&self) -> Result<Vec<PathBuf>> {
        match self {
            Self::None => Ok(Vec::new()),
            Self::Chroot(b) => b.export(),
        }
    }

    /// Source packages from the last build, the input for uploads
    pub fn source_packages(&self) -> Result<Vec<PathBuf>> {
        match self {
            Self::None => Ok(Vec::new()),
            Self::Chroot(b) => b.source_packages(),
        }
    }

    pub fn verify(&self) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Chroot(b) => b.verify(),
        }
    }
}
