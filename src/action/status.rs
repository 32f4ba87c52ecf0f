// src/action/status.rs

//! Read-only package status report

use crate::package::Package;
use crate::state::PackageState;
use std::fmt;

/// Snapshot of everything STATUS shows for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub id: String,
    pub name: String,
    pub source: &'static str,
    pub origin: Option<String>,
    pub working_copy: bool,
    pub revision: Option<String>,
    pub date: Option<String>,
    /// `version-release` as written in the description, or why it could not be read
    pub description: Result<(String, String), String>,
    pub builder: &'static str,
    pub uploader: &'static str,
    pub state: PackageState,
}

impl StatusReport {
    pub fn collect(package: &Package) -> Self {
        let description = package
            .load_description()
            .and_then(|doc| {
                let version = doc.version_value()?.to_string();
                let release = doc.release_value()?.to_string();
                Ok((version, release))
            })
            .map_err(|e| e.to_string());

        // Unreadable state is shown as empty rather than failing the report
        let state = package.state.load().unwrap_or_default();

        Self {
            id: package.id.clone(),
            name: package.name.clone(),
            source: package.source.kind(),
            origin: package.source.origin().map(String::from),
            working_copy: package.source.working_copy_exists(),
            revision: package.source.rev(),
            date: package.source.date(),
            description,
            builder: package.builder.kind(),
            uploader: package.uploader.kind(),
            state,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.id, self.name)?;

        match &self.origin {
            Some(origin) => writeln!(f, "  source:       {} {}", self.source, origin)?,
            None => writeln!(f, "  source:       {}", self.source)?,
        }
        writeln!(
            f,
            "  working copy: {}",
            if self.working_copy { "present" } else { "absent" }
        )?;
        if let Some(rev) = &self.revision {
            writeln!(f, "  revision:     {}", rev)?;
        }
        if let Some(date) = &self.date {
            writeln!(f, "  date:         {}", date)?;
        }

        match &self.description {
            Ok((version, release)) => writeln!(f, "  description:  {}-{}", version, release)?,
            Err(e) => writeln!(f, "  description:  unreadable ({})", e)?,
        }
        writeln!(f, "  builder:      {}", self.builder)?;
        write!(f, "  uploader:     {}", self.uploader)?;

        if let (Some(version), Some(release)) = (&self.state.last_version, self.state.last_release)
        {
            write!(f, "\n  constructed:  {}-{}", version, release)?;
            if let Some(at) = self.state.constructed_at {
                write!(f, " at {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
            }
        }
        Ok(())
    }
}
