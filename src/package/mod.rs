// src/package/mod.rs

//! Packages and their configuration files
//!
//! Each package has a `<confdir>/<id>.toml` file:
//!
//! ```toml
//! [package]
//! version = "1.2"
//!
//! [source]
//! type = "git"
//! orig = "https://github.com/example/hello.git"
//! branch = "main"
//!
//! [builder]
//! type = "chroot"
//! dists = ["fedora-rawhide-x86_64"]
//!
//! [uploader]
//! type = "remote"
//! repo = "jane/hello"
//! ```
//!
//! Missing `[source]`, `[builder]` or `[uploader]` sections select the
//! `none` variants.

use crate::builder::{Builder, BuilderConfig};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::source::{Source, SourceContext, SourceSection};
use crate::spec::PackageDescription;
use crate::state::StateFile;
use crate::uploader::{Uploader, UploaderConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base version used when the package file declares none
const DEFAULT_VERSION: &str = "0";

/// Builder output below `<datadir>/<id>`, hidden so no upstream name can
/// share the directory with it
const RESULTS_DIR: &str = ".results";

/// Contents of a package file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    #[serde(default)]
    pub package: PackageSection,
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub uploader: UploaderConfig,
}

impl PackageFile {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSection {
    /// Upstream name used in archive names; the file name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Upstream base version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Path of the description, overriding `<specdir>/<id>/<name>.spec`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<PathBuf>,
}

/// One packaging project with its source, builder and uploader
#[derive(Debug, Clone)]
pub struct Package {
    /// Package file name, unique within the configuration directory
    pub id: String,
    /// Upstream name
    pub name: String,
    pub version: String,
    pub source: Source,
    pub builder: Builder,
    pub uploader: Uploader,
    /// Package description document
    pub description: PathBuf,
    pub state: StateFile,
    /// Identity written into changelog entries
    pub packager: String,
}

impl Package {
    /// Read `<confdir>/<id>.toml` and assemble the package
    pub fn load(config: &Config, id: &str) -> Result<Self> {
        let path = config.conf_dir().join(format!("{id}.toml"));
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::ConfigurationError(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!("Loaded package file {}", path.display());

        let file: PackageFile = toml::from_str(&content)
            .map_err(|e| Error::ConfigurationError(format!("{}: {}", path.display(), e)))?;
        Self::new(config, id, file)
    }

    pub fn new(config: &Config, id: &str, file: PackageFile) -> Result<Self> {
        if id.is_empty() || id.contains('/') {
            return Err(Error::ConfigurationError(format!(
                "invalid package name '{}'",
                id
            )));
        }

        let name = file
            .package
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| id.to_string());
        if name.contains('/') || name.starts_with('.') {
            return Err(Error::ConfigurationError(format!(
                "invalid upstream name '{}'",
                name
            )));
        }
        let version = file
            .package
            .version
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let description = file
            .package
            .description
            .clone()
            .unwrap_or_else(|| config.spec_dir().join(id).join(format!("{name}.spec")));
        let state = StateFile::new(config.state_dir(), id);
        let dir = config.data_dir().join(id);

        let ctx = SourceContext {
            name: name.clone(),
            version: version.clone(),
            dir: dir.clone(),
            keep: file.source.keep,
            format: file.source.format,
            state: state.clone(),
            description: description.clone(),
        };

        let source = Source::new(&file.source.kind, ctx)?;
        let builder = Builder::new(
            &file.builder,
            &name,
            dir.join(RESULTS_DIR),
            config.pack_dir().join(id),
        );
        let uploader = Uploader::new(&file.uploader);

        Ok(Self {
            id: id.to_string(),
            name,
            version,
            source,
            builder,
            uploader,
            description,
            state,
            packager: config.packager.clone(),
        })
    }

    /// Directory holding the description, used as the build's source dir
    pub fn description_dir(&self) -> &Path {
        self.description.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn load_description(&self) -> Result<PackageDescription> {
        PackageDescription::load(&self.description)
    }

    /// Configuration and environment checks
    pub fn verify(&self) -> Result<()> {
        self.source.verify()?;
        self.builder.verify()?;
        self.uploader.verify()?;

        let doc = self.load_description()?;
        doc.version()?;
        doc.release()?;
        Ok(())
    }
}
