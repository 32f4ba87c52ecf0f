// src/source/bzr.rs

//! bzr branches

use super::{SourceContext, SourceOutcome, remove_path, require_orig, write_tree};
use crate::error::{Error, Result};
use crate::process;
use crate::version::{bzr_version, expand_template, format_commit_date};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BzrConfig {
    /// Repository location, e.g. `lp:hello`
    pub orig: String,

    /// Branch below `orig`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Pin the working copy to this revision number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revno: Option<u64>,

    /// Put the commit date into the version
    #[serde(default)]
    pub track_date: bool,

    /// Version layout using `%{version}`, `%{date}` and `%{revno}`;
    /// `<version>+[<date>.]r<revno>` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_template: Option<String>,
}

impl BzrConfig {
    fn location(&self) -> String {
        match self.branch.as_deref().filter(|b| !b.is_empty()) {
            Some(branch) => format!("{}/{}", self.orig.trim_end_matches('/'), branch),
            None => self.orig.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BzrSource {
    config: BzrConfig,
    ctx: SourceContext,
}

impl BzrSource {
    pub fn new(config: BzrConfig, ctx: SourceContext) -> Result<Self> {
        require_orig("bzr", &config.orig)?;
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

    fn bzr<I: IntoIterator<Item = &'static str>>(&self, args: I) -> Command {
        process::command("bzr", args, Some(&self.working_copy()))
    }

    fn revno(&self) -> Result<String> {
        process::stdout_of(&mut self.bzr(["revno"]), Error::SourceUnavailable)
    }

    fn revno_date(&self) -> Result<String> {
        let raw = process::stdout_of(
            &mut self.bzr(["version-info", "--custom", "--template={date}"]),
            Error::SourceUnavailable,
        )?;
        format_commit_date(&raw)
    }

    fn record_state(&self) -> Result<String> {
        let rev = self.revno()?;
        let date = self.revno_date()?;
        self.ctx.state.update(|s| {
            s.last_rev = Some(rev.clone());
            s.last_date = Some(date);
        })?;
        Ok(rev)
    }

    pub fn get(&self) -> Result<SourceOutcome> {
        let dest = self.working_copy();
        if dest.exists() {
            let rev = self.record_state()?;
            info!("Sources already downloaded, latest revision {}", rev);
            return Ok(SourceOutcome::AlreadyExists);
        }

        self.ctx.ensure_dir()?;

        let mut cmd = process::command("bzr", ["branch", "--quiet"], None);
        if let Some(revno) = self.config.revno {
            cmd.args(["--revision", &revno.to_string()]);
        }
        cmd.arg(self.config.location()).arg(&dest);

        if let Err(e) = process::check(&mut cmd, Error::SourceUnavailable) {
            let _ = remove_path(&dest);
            return Err(e);
        }

        let rev = self.record_state()?;
        if let Some(revno) = self.config.revno {
            if rev != revno.to_string() {
                return Err(Error::SourceUnavailable(format!(
                    "branched revision {} instead of pinned revision {}",
                    rev, revno
                )));
            }
        }

        info!("Branched {} at revision {}", self.config.location(), rev);
        Ok(SourceOutcome::Created)
    }

    pub fn update(&self) -> Result<SourceOutcome> {
        if !self.working_copy().exists() {
            debug!("No working copy of {}, nothing to update", self.ctx.name);
            return Ok(SourceOutcome::Unchanged);
        }
        if let Some(revno) = self.config.revno {
            debug!("{} is pinned to revision {}, not updating", self.ctx.name, revno);
            return Ok(SourceOutcome::Unchanged);
        }

        let before = self.revno()?;
        process::check(&mut self.bzr(["pull", "--quiet"]), Error::SourceUnavailable)?;
        let after = self.record_state()?;

        if before == after {
            info!("No new revisions for {}", self.ctx.name);
            Ok(SourceOutcome::Unchanged)
        } else {
            info!("Updated {} from r{} to r{}", self.ctx.name, before, after);
            Ok(SourceOutcome::Changed)
        }
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
        self.record_state()?;
        info!("Exported {}", dest.display());

        if !self.ctx.keep {
            remove_path(&src)?;
            info!("bzr branch of {} removed after export", self.ctx.name);
        }
        Ok(Some(dest))
    }

    fn current_rev(&self) -> Result<String> {
        if self.working_copy().exists() {
            return self.revno();
        }
        self.ctx.state.load()?.last_rev.ok_or_else(|| {
            Error::SourceUnavailable(format!(
                "sources of {} need to be fetched before the revision is known",
                self.ctx.name
            ))
        })
    }

    fn current_date(&self) -> Result<String> {
        if self.working_copy().exists() {
            return self.revno_date();
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
        let template = self.config.version_template.as_deref().filter(|t| !t.is_empty());
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
                    ("revno", rev.as_str()),
                ],
            ),
            None => Ok(bzr_version(&self.ctx.version, &rev, date.as_deref())),
        }
    }

    pub fn rev(&self) -> Option<String> {
        self.current_rev().ok()
    }

    pub fn date(&self) -> Option<String> {
        self.current_date().ok()
    }

    pub fn verify(&self) -> Result<()> {
        if !process::is_available("bzr") {
            return Err(Error::ConfigurationError(
                "install bzr to use this source".to_string(),
            ));
        }
        Ok(())
    }
}
