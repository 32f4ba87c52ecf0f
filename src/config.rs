// src/config.rs

//! Process-wide configuration
//!
//! A [`Config`] is built once at startup and handed to every package. It is
//! assembled from layers, later layers winning:
//!
//! 1. Built-in defaults (`$XDG_DATA_HOME/centaur`)
//! 2. The configuration file (`--config`, else `$XDG_CONFIG_HOME/centaur/config.toml`)
//! 3. Environment (`CENTAUR_BASEDIR`, `CENTAUR_PACKAGER`)
//! 4. Command line (`--basedir`)
//!
//! # Example config.toml
//!
//! ```toml
//! [main]
//! basedir = "~/packaging"
//! packager = "Jane Doe <jane@example.com>"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the data root
pub const ENV_BASEDIR: &str = "CENTAUR_BASEDIR";

/// Environment variable overriding the changelog packager identity
pub const ENV_PACKAGER: &str = "CENTAUR_PACKAGER";

const DEFAULT_PACKAGER: &str = "Centaur <centaur@localhost>";

/// On-disk shape of the configuration file
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    main: MainSection,
}

#[derive(Debug, Default, Deserialize)]
struct MainSection {
    basedir: Option<String>,
    packager: Option<String>,
    confdir: Option<String>,
    datadir: Option<String>,
    specdir: Option<String>,
    packdir: Option<String>,
}

/// Resolved configuration shared by all packages of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Data root; every other directory defaults to a child of it
    pub basedir: PathBuf,
    /// Name and mail used in changelog entries
    pub packager: String,
    confdir: Option<PathBuf>,
    datadir: Option<PathBuf>,
    specdir: Option<PathBuf>,
    packdir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let basedir = dirs::data_dir()
            .map(|d| d.join("centaur"))
            .unwrap_or_else(|| PathBuf::from("centaur"));
        Self::with_basedir(basedir)
    }
}

impl Config {
    /// Configuration rooted at `basedir` with default sub-directories
    pub fn with_basedir(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
            packager: DEFAULT_PACKAGER.to_string(),
            confdir: None,
            datadir: None,
            specdir: None,
            packdir: None,
        }
    }

    /// Load configuration from all layers
    ///
    /// `path` is an explicit config file; when it is `None` the per-user file
    /// is read if it exists.
    pub fn load(path: Option<&Path>, basedir: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        if let Some(file) = file {
            debug!("Reading configuration from {}", file.display());
            let content = std::fs::read_to_string(&file).map_err(|e| {
                Error::ConfigurationError(format!("cannot read {}: {}", file.display(), e))
            })?;
            config.merge_file(&content)?;
        }

        config.merge_env(|key| std::env::var(key).ok());

        if let Some(dir) = basedir {
            config.basedir = dir;
        }

        Ok(config)
    }

    /// Apply a configuration file layer
    pub fn merge_file(&mut self, content: &str) -> Result<()> {
        let file: ConfigFile = toml::from_str(content)?;
        let main = file.main;

        if let Some(basedir) = main.basedir {
            self.basedir = expand_home(&basedir);
        }
        if let Some(packager) = main.packager {
            self.packager = packager;
        }
        self.confdir = main.confdir.map(|d| expand_home(&d)).or(self.confdir.take());
        self.datadir = main.datadir.map(|d| expand_home(&d)).or(self.datadir.take());
        self.specdir = main.specdir.map(|d| expand_home(&d)).or(self.specdir.take());
        self.packdir = main.packdir.map(|d| expand_home(&d)).or(self.packdir.take());

        Ok(())
    }

    /// Apply the environment layer through a lookup function
    pub fn merge_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(basedir) = lookup(ENV_BASEDIR).filter(|v| !v.is_empty()) {
            self.basedir = expand_home(&basedir);
        }
        if let Some(packager) = lookup(ENV_PACKAGER).filter(|v| !v.is_empty()) {
            self.packager = packager;
        }
    }

    /// Directory holding `<name>.toml` package files
    pub fn conf_dir(&self) -> PathBuf {
        self.confdir
            .clone()
            .unwrap_or_else(|| self.basedir.join("configs"))
    }

    /// Directory holding per-package working copies and source archives
    pub fn data_dir(&self) -> PathBuf {
        self.datadir
            .clone()
            .unwrap_or_else(|| self.basedir.join("sources"))
    }

    /// Directory holding per-package descriptions
    pub fn spec_dir(&self) -> PathBuf {
        self.specdir
            .clone()
            .unwrap_or_else(|| self.basedir.join("specs"))
    }

    /// Directory receiving exported build artifacts
    pub fn pack_dir(&self) -> PathBuf {
        self.packdir
            .clone()
            .unwrap_or_else(|| self.basedir.join("packages"))
    }

    /// Directory holding persisted per-package state
    pub fn state_dir(&self) -> PathBuf {
        self.basedir.join("state")
    }

    /// Names of every package with a file in the configuration directory
    pub fn package_names(&self) -> Result<Vec<String>> {
        let dir = self.conf_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();

        Ok(names)
    }
}

/// Per-user configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("centaur").join("config.toml"))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
