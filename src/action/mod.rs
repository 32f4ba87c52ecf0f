// src/action/mod.rs

//! The action surface
//!
//! Every user-visible operation is an action run against one [`Package`].
//! Actions never return an error: failures of the source, builder or
//! uploader are caught here and folded into a classified [`ActionResult`].

mod chain;
mod status;

pub use chain::{ChainReport, chain_steps, run_chain};
pub use status::StatusReport;

use crate::error::{Error, ErrorKind, Result};
use crate::package::Package;
use crate::source::SourceOutcome;
use crate::spec::{ChangelogStamp, SpecRewriter};
use crate::version;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Named actions, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Get,
    Update,
    Refresh,
    Prepare,
    Construct,
    Build,
    Export,
    Upload,
    Clean,
    Status,
    Verify,
    Chain,
}

impl ActionKind {
    pub fn all() -> &'static [ActionKind] {
        &[
            Self::Get,
            Self::Update,
            Self::Refresh,
            Self::Prepare,
            Self::Construct,
            Self::Build,
            Self::Export,
            Self::Upload,
            Self::Clean,
            Self::Status,
            Self::Verify,
            Self::Chain,
        ]
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Update => "update",
            Self::Refresh => "refresh",
            Self::Prepare => "prepare",
            Self::Construct => "construct",
            Self::Build => "build",
            Self::Export => "export",
            Self::Upload => "upload",
            Self::Clean => "clean",
            Self::Status => "status",
            Self::Verify => "verify",
            Self::Chain => "chain",
        }
    }

    /// Actions that only read state
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Status | Self::Verify)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::ConfigurationError(format!("unknown action '{}'", s)))
    }
}

/// Outcome of one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub action: ActionKind,
    pub succeeded: bool,
    /// Failure classification; on success only `AlreadyExists` appears here
    pub reason: Option<ErrorKind>,
    /// Human-readable summary
    pub message: String,
}

impl ActionResult {
    pub fn success(action: ActionKind, message: impl Into<String>) -> Self {
        Self {
            action,
            succeeded: true,
            reason: None,
            message: message.into(),
        }
    }

    pub fn failure(action: ActionKind, err: &Error) -> Self {
        Self {
            action,
            succeeded: false,
            reason: Some(err.kind()),
            message: err.to_string(),
        }
    }

    /// Fold a fallible operation into a result
    pub fn from_result<T, F>(action: ActionKind, result: Result<T>, describe: F) -> Self
    where
        F: FnOnce(T) -> String,
    {
        match result {
            Ok(value) => Self::success(action, describe(value)),
            Err(e) => Self::failure(action, &e),
        }
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.succeeded { "ok" } else { "failed" };
        match self.reason {
            Some(reason) => write!(f, "{} {} [{}]: {}", self.action, verdict, reason, self.message),
            None => write!(f, "{} {}: {}", self.action, verdict, self.message),
        }
    }
}

/// Run `kind` against `package`
pub fn run(kind: ActionKind, package: &Package) -> ActionResult {
    info!("{} {}", kind, package.id);

    let result = match kind {
        ActionKind::Get => get(package),
        ActionKind::Update => update(package),
        ActionKind::Refresh => refresh(package),
        ActionKind::Prepare => prepare(package),
        ActionKind::Construct => construct(package),
        ActionKind::Build => build(package),
        ActionKind::Export => export(package),
        ActionKind::Upload => upload(package),
        ActionKind::Clean => clean(package),
        ActionKind::Status => status(package),
        ActionKind::Verify => verify(package),
        ActionKind::Chain => run_chain(package).into_result(),
    };

    if result.succeeded {
        info!("{}: {}", package.id, result);
    } else {
        error!("{}: {}", package.id, result);
    }
    result
}

fn outcome_result(action: ActionKind, outcome: Result<SourceOutcome>) -> ActionResult {
    match outcome {
        Ok(SourceOutcome::AlreadyExists) => ActionResult {
            action,
            succeeded: true,
            reason: Some(ErrorKind::AlreadyExists),
            message: "sources already present".to_string(),
        },
        Ok(other) => ActionResult::success(action, format!("sources {}", other.as_str())),
        Err(e) => ActionResult::failure(action, &e),
    }
}

pub fn get(package: &Package) -> ActionResult {
    outcome_result(ActionKind::Get, package.source.get())
}

pub fn update(package: &Package) -> ActionResult {
    outcome_result(ActionKind::Update, package.source.update())
}

pub fn refresh(package: &Package) -> ActionResult {
    outcome_result(ActionKind::Refresh, package.source.refresh())
}

/// Export the source archive and stage it next to the description
///
/// Returns `None` for sources without an archive.
fn stage_sources(package: &Package) -> Result<Option<PathBuf>> {
    let Some(archive) = package.source.export()? else {
        return Ok(None);
    };

    let dir = package.description_dir();
    fs::create_dir_all(dir)?;
    let file = archive
        .file_name()
        .ok_or_else(|| Error::IoError(format!("no file name in {}", archive.display())))?;
    let staged = dir.join(file);

    if staged != archive {
        debug!("Staging {} in {}", archive.display(), dir.display());
        fs::copy(&archive, &staged)?;
    }
    Ok(Some(staged))
}

pub fn prepare(package: &Package) -> ActionResult {
    ActionResult::from_result(ActionKind::Prepare, stage_sources(package), |staged| {
        match staged {
            Some(path) => format!("staged {}", path.display()),
            None => "no source archive to stage".to_string(),
        }
    })
}

/// Derive the version, rewrite the description and stage sources
///
/// Changelog entries are stamped with today's date.
pub fn construct(package: &Package) -> ActionResult {
    construct_with(package, ChangelogStamp::today(package.packager.clone()))
}

pub fn construct_with(package: &Package, stamp: ChangelogStamp) -> ActionResult {
    ActionResult::from_result(
        ActionKind::Construct,
        construct_inner(package, stamp),
        |(version, release)| format!("{}-{}", version, release),
    )
}

fn construct_inner(package: &Package, stamp: ChangelogStamp) -> Result<(String, u32)> {
    let doc = package.load_description()?;
    let recorded = doc.version()?;

    let fingerprint = version::derive(&package.source, recorded.as_deref())?;
    debug!(
        "Derived {} from revision '{}' (new: {})",
        fingerprint.version, fingerprint.revision, fingerprint.is_new
    );

    let rewrite = SpecRewriter::new(stamp).rewrite(&doc, &fingerprint)?;
    rewrite.document.save(&package.description)?;
    info!(
        "{}: {} to {}-{}",
        package.id,
        rewrite.kind.as_str(),
        rewrite.version,
        rewrite.release
    );

    stage_sources(package)?;

    let (version, release) = (rewrite.version, rewrite.release);
    package.state.update(|s| {
        s.last_version = Some(version.clone());
        s.last_release = Some(release);
        s.constructed_at = Some(chrono::Utc::now());
    })?;

    Ok((version, release))
}

pub fn build(package: &Package) -> ActionResult {
    let result = stage_sources(package)
        .and_then(|archive| package.builder.build(&package.description, archive.as_deref()));

    ActionResult::from_result(ActionKind::Build, result, |artifacts| {
        if package.builder.is_none() {
            "building disabled".to_string()
        } else {
            format!("{} package(s) built", artifacts.len())
        }
    })
}

pub fn export(package: &Package) -> ActionResult {
    ActionResult::from_result(ActionKind::Export, package.builder.export(), |exported| {
        format!("{} package(s) exported", exported.len())
    })
}

pub fn upload(package: &Package) -> ActionResult {
    if package.uploader.is_none() {
        return ActionResult::success(ActionKind::Upload, "no uploader configured");
    }

    let result = package
        .builder
        .source_packages()
        .and_then(|srpms| package.uploader.upload(&srpms));

    ActionResult::from_result(ActionKind::Upload, result, |uploaded| {
        format!("{} package(s) uploaded", uploaded.len())
    })
}

pub fn clean(package: &Package) -> ActionResult {
    ActionResult::from_result(ActionKind::Clean, package.source.clean(), |()| {
        if package.source.context().keep {
            "sources kept".to_string()
        } else {
            "sources removed".to_string()
        }
    })
}

pub fn status(package: &Package) -> ActionResult {
    ActionResult::success(ActionKind::Status, StatusReport::collect(package).to_string())
}

pub fn verify(package: &Package) -> ActionResult {
    let result = package.verify();
    if let Err(e) = &result {
        warn!("{} failed verification: {}", package.id, e);
    }
    ActionResult::from_result(ActionKind::Verify, result, |()| {
        "configuration is consistent".to_string()
    })
}
