// src/spec/rewrite.rs

//! Version/release reconciliation
//!
//! Compares the version recorded in a description with a freshly derived
//! [`VersionFingerprint`] and edits the document in place:
//!
//! | Recorded state            | Result                                  |
//! |---------------------------|-----------------------------------------|
//! | placeholder / empty       | Version = derived, Release = 1          |
//! | Version == derived        | Release + 1                             |
//! | Version != derived        | Version = derived, Release = 1          |
//!
//! Only the `Version:`/`Release:` lines change and one changelog entry is
//! inserted; every other line is kept as it was.

use super::changelog::{ChangelogEntry, ChangelogStamp, insert_entry};
use super::{PackageDescription, Release, format_tag_line, is_tag_line};
use crate::error::{Error, Result};
use crate::version::VersionFingerprint;
use tracing::debug;

/// Which branch of the reconciliation was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteKind {
    /// The description had never been bumped
    Initial,
    /// Same version, release counter incremented
    ReleaseBump,
    /// New version, release counter reset
    VersionBump,
}

impl RewriteKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::ReleaseBump => "release bump",
            Self::VersionBump => "version bump",
        }
    }
}

/// Outcome of one rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub kind: RewriteKind,
    pub version: String,
    pub release: u32,
    pub document: PackageDescription,
}

/// Structural editor for `Version:`/`Release:` and `%changelog`
#[derive(Debug, Clone)]
pub struct SpecRewriter {
    stamp: ChangelogStamp,
}

impl SpecRewriter {
    pub fn new(stamp: ChangelogStamp) -> Self {
        Self { stamp }
    }

    pub fn rewrite(
        &self,
        doc: &PackageDescription,
        fingerprint: &VersionFingerprint,
    ) -> Result<Rewrite> {
        let recorded_version = doc.version()?;
        let recorded_release = doc.release()?;

        let (kind, release) = match (&recorded_version, recorded_release.number) {
            (None, _) | (_, None) => (RewriteKind::Initial, recorded_release.with_number(1)),
            (Some(v), Some(n)) if *v == fingerprint.version => {
                let next = n.checked_add(1).ok_or_else(|| {
                    Error::InvalidRelease(format!("release {} cannot be incremented", n))
                })?;
                (RewriteKind::ReleaseBump, recorded_release.with_number(next))
            }
            (Some(_), Some(_)) => (RewriteKind::VersionBump, recorded_release.with_number(1)),
        };

        let release_number = release.number.unwrap_or(1);
        let version = fingerprint.version.clone();
        debug!(
            "Rewriting description: {:?} -> {}-{} ({})",
            recorded_version,
            version,
            release,
            kind.as_str()
        );

        let mut lines: Vec<String> = doc.content().split('\n').map(String::from).collect();
        let mut version_done = false;
        let mut release_done = false;
        for line in lines.iter_mut() {
            if !version_done && is_tag_line(line, "Version") {
                if kind != RewriteKind::ReleaseBump {
                    *line = format_tag_line("Version", &version);
                }
                version_done = true;
            } else if !release_done && is_tag_line(line, "Release") {
                *line = format_tag_line("Release", &release.to_string());
                release_done = true;
            }
        }

        let entry = ChangelogEntry {
            stamp: self.stamp.clone(),
            evr: format!("{}-{}", version, release_number),
            note: note_for(kind, fingerprint),
        };
        insert_entry(&mut lines, &entry);

        Ok(Rewrite {
            kind,
            version,
            release: release_number,
            document: PackageDescription::parse(lines.join("\n")),
        })
    }
}

fn note_for(kind: RewriteKind, fingerprint: &VersionFingerprint) -> String {
    let revision = fingerprint.revision.trim();
    match kind {
        RewriteKind::Initial => "Initial package build".to_string(),
        RewriteKind::ReleaseBump if revision.is_empty() => "Rebuild".to_string(),
        RewriteKind::ReleaseBump => format!("Rebuild at {}", revision),
        RewriteKind::VersionBump if revision.is_empty() => {
            format!("Update to {}", fingerprint.version)
        }
        RewriteKind::VersionBump => format!("Update to {} ({})", fingerprint.version, revision),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SPEC: &str = "\
%global debug_package %{nil}

Name:           hello
Version:        1.2
Release:        3%{?dist}
Summary:        Says hello
License:        MIT

%description
Says hello.

%changelog
* Mon Jan 04 2016 Jane Doe <jane@example.com> - 1.2-3
- Rebuild
";

    fn rewriter() -> SpecRewriter {
        SpecRewriter::new(ChangelogStamp::new(
            NaiveDate::from_ymd_opt(2016, 4, 22).unwrap(),
            "Jane Doe <jane@example.com>",
        ))
    }

    fn changelog_entries(doc: &PackageDescription) -> usize {
        doc.content().lines().filter(|l| l.starts_with("* ")).count()
    }

    #[test]
    fn test_same_version_bumps_release() {
        let doc = PackageDescription::parse(SPEC);
        let fp = VersionFingerprint::new("1.2", "abcdef1");

        let result = rewriter().rewrite(&doc, &fp).unwrap();

        assert_eq!(result.kind, RewriteKind::ReleaseBump);
        assert_eq!((result.version.as_str(), result.release), ("1.2", 4));
        assert_eq!(result.document.version().unwrap().as_deref(), Some("1.2"));
        assert_eq!(result.document.release_value().unwrap(), "4%{?dist}");
        assert_eq!(changelog_entries(&result.document), 2);
        assert!(
            result
                .document
                .content()
                .contains("* Fri Apr 22 2016 Jane Doe <jane@example.com> - 1.2-4\n- Rebuild at abcdef1\n")
        );
    }

    #[test]
    fn test_new_version_resets_release() {
        let doc = PackageDescription::parse(SPEC);
        let fp = VersionFingerprint::new("1.3+abcdef1", "abcdef1");

        let result = rewriter().rewrite(&doc, &fp).unwrap();

        assert_eq!(result.kind, RewriteKind::VersionBump);
        assert_eq!(result.release, 1);
        assert_eq!(result.document.version_value().unwrap(), "1.3+abcdef1");
        assert_eq!(result.document.release_value().unwrap(), "1%{?dist}");
        assert_eq!(changelog_entries(&result.document), 2);
        assert!(result.document.content().contains("- Update to 1.3+abcdef1 (abcdef1)\n"));
    }

    #[test]
    fn test_repeated_rewrite_keeps_incrementing() {
        let fp = VersionFingerprint::new("1.2", "");
        let mut doc = PackageDescription::parse(SPEC);

        for expected in 4..7 {
            let result = rewriter().rewrite(&doc, &fp).unwrap();
            assert_eq!(result.release, expected);
            doc = result.document;
        }
        assert_eq!(changelog_entries(&doc), 4);
    }

    #[test]
    fn test_round_trip() {
        let doc = PackageDescription::parse(SPEC);
        let fp = VersionFingerprint::new("2.0+160422.234950.abcdef1", "abcdef1");
        let result = rewriter().rewrite(&doc, &fp).unwrap();

        let reparsed = PackageDescription::parse(result.document.content());
        assert_eq!(reparsed.version().unwrap(), Some(result.version.clone()));
        assert_eq!(reparsed.release().unwrap().number, Some(result.release));
    }

    #[test]
    fn test_other_lines_untouched() {
        let doc = PackageDescription::parse(SPEC);
        let fp = VersionFingerprint::new("1.3", "r42");
        let result = rewriter().rewrite(&doc, &fp).unwrap();

        let before: Vec<&str> = SPEC
            .lines()
            .filter(|l| !l.starts_with("Version:") && !l.starts_with("Release:"))
            .collect();
        let after = result.document.content();
        for line in before {
            assert!(after.contains(line), "lost line: {line}");
        }
        assert!(after.starts_with("%global debug_package %{nil}\n"));
        assert!(after.ends_with("- Rebuild\n"));
    }

    #[test]
    fn test_placeholder_initialises() {
        let doc = PackageDescription::parse(
            "Name: hello\nVersion: @VERSION@\nRelease: @RELEASE@%{?dist}\n\n%changelog\n",
        );
        let fp = VersionFingerprint::new("0.1+r7", "7");
        let result = rewriter().rewrite(&doc, &fp).unwrap();

        assert_eq!(result.kind, RewriteKind::Initial);
        assert_eq!(result.release, 1);
        assert_eq!(result.document.version_value().unwrap(), "0.1+r7");
        assert_eq!(result.document.release_value().unwrap(), "1%{?dist}");
        assert!(result.document.content().contains("- Initial package build\n"));
    }

    #[test]
    fn test_malformed_and_invalid() {
        let fp = VersionFingerprint::new("1.0", "");

        let missing = PackageDescription::parse("Name: hello\nRelease: 1\n");
        assert!(matches!(
            rewriter().rewrite(&missing, &fp),
            Err(Error::MalformedDescription(_))
        ));

        let bad_release = PackageDescription::parse("Version: 1.0\nRelease: beta\n");
        assert!(matches!(
            rewriter().rewrite(&bad_release, &fp),
            Err(Error::InvalidRelease(_))
        ));
    }

    #[test]
    fn test_changelog_section_added() {
        let doc = PackageDescription::parse("Version: 1.0\nRelease: 1\n");
        let fp = VersionFingerprint::new("1.0", "");
        let result = rewriter().rewrite(&doc, &fp).unwrap();

        assert_eq!(
            result.document.content(),
            "Version: 1.0\nRelease:        2\n\n%changelog\n\
             * Fri Apr 22 2016 Jane Doe <jane@example.com> - 1.0-2\n- Rebuild\n\n"
        );
    }
}
