// src/state.rs

//! Persisted per-package state
//!
//! Keeps the last known revision, commit date, version and release of a
//! package between runs. VCS sources fall back to these values once their
//! working copy has been removed after export.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Values remembered for one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageState {
    /// Last observed VCS revision (commit id or revision number)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rev: Option<String>,

    /// Last observed commit date, already formatted (`YYMMDD.HHMMSS`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_date: Option<String>,

    /// Version written by the last CONSTRUCT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_version: Option<String>,

    /// Release written by the last CONSTRUCT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_release: Option<u32>,

    /// When the last CONSTRUCT happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// JSON-backed store for one package's state
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// State file for `name` inside `state_dir`
    pub fn new(state_dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: state_dir.as_ref().join(format!("{name}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state; a missing file yields the default state
    pub fn load(&self) -> Result<PackageState> {
        if !self.path.exists() {
            return Ok(PackageState::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrite the stored state
    pub fn save(&self, state: &PackageState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Load, modify and save in one step
    pub fn update<F>(&self, f: F) -> Result<PackageState>
    where
        F: FnOnce(&mut PackageState),
    {
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)?;
        debug!("Updated state file {}", self.path.display());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let temp = tempfile::tempdir().unwrap();
        let file = StateFile::new(temp.path(), "hello");
        assert_eq!(file.load().unwrap(), PackageState::default());
    }

    #[test]
    fn test_persistence() {
        let temp = tempfile::tempdir().unwrap();

        {
            let file = StateFile::new(temp.path().join("state"), "hello");
            file.update(|s| {
                s.last_rev = Some("5b88c95c45e91781aed441c446210c6979350c3f".to_string());
                s.last_date = Some("160820.083657".to_string());
            })
            .unwrap();
        }

        {
            let file = StateFile::new(temp.path().join("state"), "hello");
            let state = file.load().unwrap();
            assert_eq!(state.last_date.as_deref(), Some("160820.083657"));
            assert!(state.last_version.is_none());
        }
    }

    #[test]
    fn test_update_preserves_other_fields() {
        let temp = tempfile::tempdir().unwrap();
        let file = StateFile::new(temp.path(), "hello");

        file.update(|s| s.last_rev = Some("42".to_string())).unwrap();
        let state = file
            .update(|s| {
                s.last_version = Some("1.0+r42".to_string());
                s.last_release = Some(1);
            })
            .unwrap();

        assert_eq!(state.last_rev.as_deref(), Some("42"));
        assert_eq!(state.last_release, Some(1));
    }
}
