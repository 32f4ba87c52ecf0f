// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use centaur::{Config, Package};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Minimal package description with a changelog section
pub const DESCRIPTION: &str = "\
Name:           hello
Version:        1.0
Release:        1%{?dist}
Summary:        Prints a greeting
License:        MIT
Source0:        %{name}-%{version}.tar.gz

%description
Prints a greeting.

%changelog
";

/// A temporary data root with its configuration
///
/// Keep the value alive for the duration of the test; dropping it removes
/// the directory.
pub struct Workspace {
    pub dir: TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_basedir(dir.path());
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `configs/<id>.toml` and the default description, then load it
    pub fn add_package(&self, id: &str, file: &str) -> Package {
        let confdir = self.config.conf_dir();
        fs::create_dir_all(&confdir).unwrap();
        fs::write(confdir.join(format!("{id}.toml")), file).unwrap();

        let specdir = self.config.spec_dir().join(id);
        fs::create_dir_all(&specdir).unwrap();
        fs::write(specdir.join(format!("{id}.spec")), DESCRIPTION).unwrap();

        Package::load(&self.config, id).unwrap()
    }

    /// Write an executable shell script and return its path
    pub fn script(&self, name: &str, body: &str) -> String {
        let path = self.root().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// mock stand-in that creates empty packages in its result directory
    pub fn fake_mock(&self) -> String {
        self.mock_script("fake-mock", "true")
    }

    /// Like [`Workspace::fake_mock`], but the source package build fails
    /// unless `archive` is in the directory passed as `--sources`
    pub fn fake_mock_needing(&self, archive: &str) -> String {
        self.mock_script(
            "fake-mock-sources",
            &format!("[ -f \"$sources/{archive}\" ] || {{ echo \"missing {archive}\" >&2; exit 1; }}"),
        )
    }

    fn mock_script(&self, name: &str, srpm_check: &str) -> String {
        self.script(
            name,
            &format!(
                "srpm=no\n\
                 while [ $# -gt 0 ]; do\n\
                   case \"$1\" in\n\
                     --resultdir) shift; out=\"$1\" ;;\n\
                     --sources) shift; sources=\"$1\" ;;\n\
                     --buildsrpm) srpm=yes ;;\n\
                   esac\n\
                   shift\n\
                 done\n\
                 mkdir -p \"$out\"\n\
                 if [ \"$srpm\" = yes ]; then {srpm_check} && touch \"$out/hello-1.0-1.src.rpm\"; \
                 else touch \"$out/hello-1.0-1.x86_64.rpm\"; fi"
            ),
        )
    }

    /// Upload client stand-in that appends its arguments to `log`
    pub fn fake_uploader(&self, log: &Path) -> String {
        self.script("fake-copr", &format!("echo \"$@\" >> '{}'", log.display()))
    }

    /// Directory receiving exported packages for `id`
    pub fn packages(&self, id: &str) -> PathBuf {
        self.config.pack_dir().join(id)
    }
}

pub fn have_git() -> bool {
    centaur::process::is_available("git")
}

/// Run git in `dir` with a fixed identity and commit date
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .current_dir(dir)
        .env("GIT_COMMITTER_DATE", "2016-04-22T23:49:50+00:00")
        .env("GIT_AUTHOR_DATE", "2016-04-22T23:49:50+00:00")
        .output()
        .unwrap();
    assert!(output.status.success(), "git {:?} failed", args);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Upstream git repository with one commit
pub fn git_upstream(root: &Path) -> PathBuf {
    let repo = root.join("upstream");
    fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "--quiet"]);
    fs::write(repo.join("README"), "hello").unwrap();
    git(&repo, &["add", "README"]);
    git(&repo, &["commit", "--quiet", "-m", "initial"]);
    repo
}

pub fn have_bzr() -> bool {
    centaur::process::is_available("bzr")
}

/// Run bzr in `dir` with a fixed identity
pub fn bzr(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("bzr")
        .args(args)
        .current_dir(dir)
        .env("BZR_EMAIL", "Test <test@example.com>")
        .output()
        .unwrap();
    assert!(output.status.success(), "bzr {:?} failed", args);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Upstream bzr branch with one revision
pub fn bzr_upstream(root: &Path) -> PathBuf {
    let repo = root.join("upstream");
    fs::create_dir_all(&repo).unwrap();
    bzr(&repo, &["init", "--quiet"]);
    fs::write(repo.join("README"), "hello").unwrap();
    bzr(&repo, &["add", "--quiet", "README"]);
    bzr(&repo, &["commit", "--quiet", "-m", "initial"]);
    repo
}
