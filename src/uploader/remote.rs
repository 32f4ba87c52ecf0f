// src/uploader/remote.rs

//! copr-style remote build service client
//!
//! Each source package is submitted with
//! `<command> build <repo> [--chroot <dist>]... [--nowait] <srpm>`.

use crate::error::{Error, Result, UploadFailureKind};
use crate::process;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Client executable
    #[serde(default = "default_command")]
    pub command: String,

    /// Target project on the service
    pub repo: String,

    /// Chroots to build in; the project defaults when empty
    #[serde(default)]
    pub dists: Vec<String>,

    /// Wait for remote builds to finish
    #[serde(default = "default_true")]
    pub wait: bool,

    /// Keep source packages after a successful upload
    #[serde(default = "default_true")]
    pub keep: bool,
}

fn default_command() -> String {
    "copr-cli".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct RemoteUploader {
    config: RemoteConfig,
}

impl RemoteUploader {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    pub fn upload(&self, artifacts: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let srpms: Vec<&PathBuf> = artifacts
            .iter()
            .filter(|p| p.to_string_lossy().ends_with(".src.rpm"))
            .collect();

        if srpms.is_empty() {
            return Err(Error::upload(
                UploadFailureKind::Rejected,
                "no source package to upload",
            ));
        }

        let mut uploaded = Vec::with_capacity(srpms.len());
        for srpm in srpms {
            let mut cmd = process::command(
                &self.config.command,
                ["build", self.config.repo.as_str()],
                None,
            );
            for dist in &self.config.dists {
                cmd.args(["--chroot", dist]);
            }
            if !self.config.wait {
                cmd.arg("--nowait");
            }
            cmd.arg(srpm);

            info!("Uploading {} to {}", srpm.display(), self.config.repo);
            // a client that cannot be started never reached the service
            let output = process::run(&mut cmd).map_err(|e| {
                Error::upload(UploadFailureKind::Network, e.to_string())
            })?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let kind = classify_failure(&stderr);
                return Err(Error::upload(kind, process::failure_message(&cmd, &output)));
            }

            if !self.config.keep {
                if let Err(e) = fs::remove_file(srpm) {
                    warn!("Could not remove {}: {}", srpm.display(), e);
                }
            }
            uploaded.push(srpm.clone());
        }

        Ok(uploaded)
    }

    pub fn verify(&self) -> Result<()> {
        if self.config.repo.trim().is_empty() {
            return Err(Error::ConfigurationError(
                "remote uploader requires a 'repo'".to_string(),
            ));
        }
        if !process::is_available(&self.config.command) {
            return Err(Error::ConfigurationError(format!(
                "upload client '{}' not found",
                self.config.command
            )));
        }
        Ok(())
    }
}

/// Sort a client's error output into credential, transport and
/// server-side problems
pub fn classify_failure(stderr: &str) -> UploadFailureKind {
    let text = stderr.to_ascii_lowercase();

    const AUTH: &[&str] = &[
        "401",
        "403",
        "unauthorized",
        "forbidden",
        "authentication",
        "token",
        "login",
        "credentials",
    ];
    const NETWORK: &[&str] = &[
        "connection",
        "could not resolve",
        "name or service not known",
        "timed out",
        "timeout",
        "network is unreachable",
        "temporary failure in name resolution",
    ];

    if AUTH.iter().any(|m| text.contains(m)) {
        UploadFailureKind::Authentication
    } else if NETWORK.iter().any(|m| text.contains(m)) {
        UploadFailureKind::Network
    } else {
        UploadFailureKind::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn uploader(command: &str, keep: bool) -> RemoteUploader {
        RemoteUploader::new(RemoteConfig {
            command: command.to_string(),
            repo: "jane/hello".to_string(),
            dists: vec!["fedora-rawhide-x86_64".to_string()],
            wait: false,
            keep,
        })
    }

    fn script(root: &Path, body: &str) -> String {
        let path = root.join("fake-copr");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn srpm(root: &Path) -> PathBuf {
        let path = root.join("hello-1.0-1.src.rpm");
        fs::write(&path, "srpm").unwrap();
        path
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure("Error: Login invalid/expired. Please visit https://copr.example/api"),
            UploadFailureKind::Authentication
        );
        assert_eq!(
            classify_failure("HTTPSConnectionPool: Max retries exceeded (Connection refused)"),
            UploadFailureKind::Network
        );
        assert_eq!(
            classify_failure("Error: Project jane/hello does not exist"),
            UploadFailureKind::Rejected
        );
    }

    #[test]
    fn test_upload_success_removes_srpm_without_keep() {
        let temp = tempfile::tempdir().unwrap();
        let srpm = srpm(temp.path());

        let uploaded = uploader("true", false).upload(&[srpm.clone()]).unwrap();
        assert_eq!(uploaded, vec![srpm.clone()]);
        assert!(!srpm.exists());
    }

    #[test]
    fn test_upload_classifies_authentication() {
        let temp = tempfile::tempdir().unwrap();
        let tool = script(temp.path(), "echo 'Error: 401 Unauthorized' >&2; exit 1");
        let srpm = srpm(temp.path());

        let err = uploader(&tool, true).upload(&[srpm.clone()]).unwrap_err();
        match err {
            Error::UploadFailure { kind, .. } => {
                assert_eq!(kind, UploadFailureKind::Authentication)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(srpm.exists());
    }

    #[test]
    fn test_missing_client_is_upload_failure() {
        let temp = tempfile::tempdir().unwrap();
        let srpm = srpm(temp.path());

        let err = uploader("centaur-no-such-copr", true)
            .upload(&[srpm])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UploadFailure {
                kind: UploadFailureKind::Network,
                ..
            }
        ));
    }

    #[test]
    fn test_upload_requires_srpm() {
        let err = uploader("true", true)
            .upload(&[PathBuf::from("hello-1.0-1.x86_64.rpm")])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UploadFailure {
                kind: UploadFailureKind::Rejected,
                ..
            }
        ));
    }

    #[test]
    fn test_verify_requires_repo() {
        let mut u = uploader("true", true);
        u.config.repo = String::new();
        assert!(matches!(u.verify(), Err(Error::ConfigurationError(_))));
    }
}
