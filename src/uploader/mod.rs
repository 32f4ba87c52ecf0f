// src/uploader/mod.rs

//! Uploads to remote build services

mod remote;

pub use remote::{RemoteConfig, RemoteUploader, classify_failure};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[uploader]` section of a package file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UploaderConfig {
    #[default]
    None,
    Remote(RemoteConfig),
}

#[derive(Debug, Clone)]
pub enum Uploader {
    /// Uploads disabled
    None,
    Remote(RemoteUploader),
}

impl Uploader {
    pub fn new(config: &UploaderConfig) -> Self {
        match config {
            UploaderConfig::None => Self::None,
            UploaderConfig::Remote(c) => Self::Remote(RemoteUploader::new(c.clone())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Remote(_) => "remote",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Submit `artifacts`; returns the ones that were accepted
    pub fn upload(&self, artifacts: &[PathBuf]) -> Result<Vec<PathBuf>> {
        match self {
            Self::None => Ok(Vec::new()),
            Self::Remote(u) => u.upload(artifacts),
        }
    }

    pub fn verify(&self) -> Result<()> {
        match self {
            Self::None => Ok(()),
            Self::Remote(u) => u.verify(),
        }
    }
}
