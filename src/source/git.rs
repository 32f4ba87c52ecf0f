// src/source/git.rs

//! git repositories

use super::{SourceContext, SourceOutcome, remove_path, require_orig, write_tar_stream};
use crate::error::{Error, Result};
use crate::process;
use crate::version::{expand_template, format_commit_date, git_version, short_rev};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    /// Repository URL or path
    pub orig: String,

    /// Branch or tag to clone; the remote default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Pin the working copy to this commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    /// Clone with `--depth=1`
    #[serde(default)]
    pub shallow: bool,

    /// Put the commit date into the version
    #[serde(default)]
    pub track_date: bool,

    /// Version layout using `%{version}`, `%{date}`, `%{shortcommit}` and
    /// `%{commit}`; `<version>+[<date>.]<shortcommit>` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_template: Option<String>,
}

impl GitConfig {
    fn template(&self) -> Option<&str> {
        self.version_template.as_deref().filter(|t| !t.is_empty())
    }

    fn pinned(&self) -> Option<&str> {
        self.commit
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "HEAD")
    }
}

#[derive(Debug, Clone)]
pub struct GitSource {
    config: GitConfig,
    ctx: SourceContext,
}

impl GitSource {
    pub fn new(config: GitConfig, ctx: SourceContext) -> Result<Self> {
        require_orig("git", &config.orig)?;
        if config.shallow && config.pinned().is_some() {
            warn!(
                "{}: shallow clones cannot check out a pinned commit, cloning in full",
                ctx.name
            );
        }
        Ok(Self { config, ctx })
    }

    pub fn context(&self) -> &SourceContext {
        &self.ctx
    }

    pub fn origin(&self) -> Option<&str> {
        Some(&self.config.orig)
    }

    pub fn working_copy(&self) -> PathBuf {
        self.ctx.work_dir()
    }

    /// `git` running inside the working copy
    fn git<I: IntoIterator<Item = &'static str>>(&self, args: I) -> Command {
        let mut cmd = process::command("git", args, Some(&self.working_copy()));
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    fn head(&self) -> Result<String> {
        process::stdout_of(&mut self.git(["rev-parse", "HEAD"]), Error::SourceUnavailable)
    }

    fn head_date(&self) -> Result<String> {
        let raw = process::stdout_of(
            &mut self.git(["show", "-s", "--format=%cI", "HEAD"]),
            Error::SourceUnavailable,
        )?;
        format_commit_date(&raw)
    }

    /// Branch or tag to follow; the remote default when none is configured
    fn configured_ref(&self) -> &str {
        self.config
            .branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or("HEAD")
    }

    fn is_detached(&self) -> Result<bool> {
        let output = process::run(&mut self.git(["symbolic-ref", "--quiet", "HEAD"]))?;
        Ok(!output.status.success())
    }

    /// Remember revision and date for when the working copy is gone
    fn record_state(&self) -> Result<(String, String)> {
        let rev = self.head()?;
        let date = self.head_date()?;
        self.ctx.state.update(|s| {
            s.last_rev = Some(rev.clone());
            s.last_date = Some(date.clone());
        })?;
        Ok((rev, date))
    }

    pub fn get(&self) -> Result<SourceOutcome> {
        let dest = self.working_copy();
        if dest.exists() {
            let (rev, _) = self.record_state()?;
            info!("Sources already downloaded, latest commit {}", rev);
            return Ok(SourceOutcome::AlreadyExists);
        }

        self.ctx.ensure_dir()?;

        let mut cmd = process::command("git", ["clone", "--quiet"], None);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        if self.config.shallow && self.config.pinned().is_none() {
            cmd.arg("--depth=1");
        }
        if let Some(branch) = self.config.branch.as_deref().filter(|b| !b.is_empty()) {
            cmd.args(["--branch", branch]);
        }
        cmd.arg(&self.config.orig).arg(&dest);

        if let Err(e) = process::check(&mut cmd, Error::SourceUnavailable) {
            let _ = remove_path(&dest);
            return Err(e);
        }

        if let Some(commit) = self.config.pinned() {
            let mut checkout = self.git(["checkout", "--quiet"]);
            checkout.arg(commit);
            process::check(&mut checkout, Error::SourceUnavailable)?;

            let head = self.head()?;
            if !head.starts_with(commit) {
                return Err(Error::SourceUnavailable(format!(
                    "checked out {} instead of pinned commit {}",
                    head, commit
                )));
            }
        }

        let (rev, date) = self.record_state()?;
        info!("Cloned {} at {} ({})", self.config.orig, rev, date);
        Ok(SourceOutcome::Created)
    }

    pub fn update(&self) -> Result<SourceOutcome> {
        if !self.working_copy().exists() {
            debug!("No working copy of {}, nothing to update", self.ctx.name);
            return Ok(SourceOutcome::Unchanged);
        }
        if let Some(commit) = self.config.pinned() {
            debug!("{} is pinned to {}, not updating", self.ctx.name, commit);
            return Ok(SourceOutcome::Unchanged);
        }

        let before = self.head()?;

        let mut fetch = self.git(["fetch", "--quiet", "--no-tags", "origin"]);
        fetch.arg(self.configured_ref());
        process::check(&mut fetch, Error::SourceUnavailable)?;

        // a tag clone leaves HEAD detached; follow the tag instead of merging
        let mut advance = if self.is_detached()? {
            self.git(["checkout", "--quiet", "--detach", "FETCH_HEAD"])
        } else {
            self.git(["merge", "--quiet", "--ff-only", "FETCH_HEAD"])
        };
        process::check(&mut advance, Error::SourceUnavailable)?;
        let (after, _) = self.record_state()?;

        if before == after {
            info!("No new commits for {}", self.ctx.name);
            Ok(SourceOutcome::Unchanged)
        } else {
            info!("Updated {} from {} to {}", self.ctx.name, before, after);
            Ok(SourceOutcome::Changed)
        }
    }

    pub fn export(&self) -> Result<Option<PathBuf>> {
        let present = self.working_copy().exists();
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
        let mut cmd = self.git(["archive", "--format=tar"]);
        cmd.arg(format!("--prefix={}/", self.ctx.archive_prefix(&version)))
            .arg("HEAD");
        let output = process::check(&mut cmd, Error::SourceUnavailable)?;
        write_tar_stream(&output.stdout, &dest, self.ctx.format)?;

        self.record_state()?;
        info!("Exported {}", dest.display());

        if !self.ctx.keep {
            remove_path(&self.working_copy())?;
        }
        Ok(Some(dest))
    }

    fn current_rev(&self) -> Result<String> {
        if self.working_copy().exists() {
            return self.head();
        }
        self.ctx.state.load()?.last_rev.ok_or_else(|| {
            Error::SourceUnavailable(format!(
                "sources of {} need to be fetched before the commit is known",
                self.ctx.name
            ))
        })
    }

    fn current_date(&self) -> Result<String> {
        if self.working_copy().exists() {
            return self.head_date();
        }
        self.ctx.state.load()?.last_date.ok_or_else(|| {
            Error::SourceUnavailable(format!(
                "sources of {} need to be fetched before the commit date is known",
                self.ctx.name
            ))
        })
    }

    pub fn formatver(&self) -> Result<String> {
        let rev = self.current_rev()?;
        let template = self.config.template();
        let date = match template {
            Some(t) if t.contains("%{date}") => Some(self.current_date()?),
            None if self.config.track_date => Some(self.current_date()?),
            _ => None,
        };

        match template {
            Some(t) => expand_template(
                t,
                &[
                    ("version", self.ctx.version.as_str()),
                    ("date", date.as_deref().unwrap_or_default()),
                    ("shortcommit", short_rev(&rev)),
                    ("commit", rev.as_str()),
                ],
            ),
            None => Ok(git_version(&self.ctx.version, &rev, date.as_deref())),
        }
    }

    pub fn rev(&self) -> Option<String> {
        self.current_rev().ok()
    }

    pub fn date(&self) -> Option<String> {
        self.current_date().ok()
    }

    pub fn verify(&self) -> Result<()> {
        if self.config.shallow && self.config.pinned().is_some() {
            return Err(Error::ConfigurationError(
                "shallow clones are not compatible with a pinned commit".to_string(),
            ));
        }
        if !process::is_available("git") {
            return Err(Error::ConfigurationError(
                "install git to use this source".to_string(),
            ));
        }
        Ok(())
    }
}
