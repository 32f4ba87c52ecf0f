// src/version.rs

//! Canonical version derivation
//!
//! Turns what a source observed upstream (base version, revision, commit
//! date, archive filename) into the canonical version string that decides
//! between a release bump and a version reset.
//!
//! | Source | Canonical version |
//! |--------|-------------------|
//! | git    | `1.2+abcdef1`, or `1.2+160422.234950.abcdef1` when tracking dates |
//! | bzr    | `1.2+r512`, or `1.2+160422.234950.r512` when tracking dates |
//! | url    | version token matched in the archive filename |
//! | local  | version already declared in the package description |
//! | none   | configured base version |

use crate::error::{Error, Result};
use crate::source::Source;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

/// Number of commit id characters kept in a git version
pub const SHORT_REV_LEN: usize = 7;

/// Pattern used for url sources that do not configure their own
pub const DEFAULT_ARCHIVE_PATTERN: &str =
    r"^.+?-(?P<version>[0-9][0-9A-Za-z.+~_]*?)\.(tar\.(gz|xz|bz2|zst)|tgz|zip)$";

/// Result of deriving a version from the current source state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFingerprint {
    /// Canonical version string
    pub version: String,
    /// Revision id, timestamp or archive name, depending on the source
    pub revision: String,
    /// Whether the version differs from the one recorded in the description
    pub is_new: bool,
}

impl VersionFingerprint {
    pub fn new(version: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            revision: revision.into(),
            is_new: false,
        }
    }
}

/// Derive the fingerprint of a source's current state
///
/// `recorded` is the version currently written in the package description,
/// if any.
pub fn derive(source: &Source, recorded: Option<&str>) -> Result<VersionFingerprint> {
    let version = source.formatver()?;
    let revision = match (source, source.rev()) {
        (Source::Git(_), Some(rev)) => short_rev(&rev).to_string(),
        (_, Some(rev)) => rev,
        (_, None) => String::new(),
    };
    let is_new = recorded != Some(version.as_str());

    Ok(VersionFingerprint {
        version,
        revision,
        is_new,
    })
}

/// Format a raw commit timestamp as `YYMMDD.HHMMSS` (UTC)
///
/// Accepts RFC 3339 (`git show --format=%cI`) and the
/// `2016-04-22 23:49:50 +0200` form printed by bzr.
pub fn format_commit_date(raw: &str) -> Result<String> {
    let raw = raw.trim();

    let parsed: DateTime<Utc> = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.with_timezone(&Utc)
    } else if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        dt.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        naive.and_utc()
    } else {
        return Err(Error::VersionParseError(format!(
            "unrecognised commit date '{}'",
            raw
        )));
    };

    Ok(parsed.format("%y%m%d.%H%M%S").to_string())
}

/// Shorten a commit id to [`SHORT_REV_LEN`] characters
pub fn short_rev(rev: &str) -> &str {
    match rev.char_indices().nth(SHORT_REV_LEN) {
        Some((idx, _)) => &rev[..idx],
        None => rev,
    }
}

/// Canonical version for a git working copy
pub fn git_version(base: &str, commit: &str, date: Option<&str>) -> String {
    match date {
        Some(date) => format!("{}+{}.{}", base, date, short_rev(commit)),
        None => format!("{}+{}", base, short_rev(commit)),
    }
}

/// Canonical version for a bzr working copy
pub fn bzr_version(base: &str, revno: &str, date: Option<&str>) -> String {
    match date {
        Some(date) => format!("{}+{}.r{}", base, date, revno),
        None => format!("{}+r{}", base, revno),
    }
}

/// Expand `%{name}` placeholders of a version template
///
/// Unknown or unterminated placeholders are configuration errors; a result
/// that is empty or contains `-` or whitespace cannot be used as a version.
pub fn expand_template(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            Error::ConfigurationError(format!(
                "unterminated placeholder in version template '{}'",
                template
            ))
        })?;
        let name = &after[..end];
        let value = vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                Error::ConfigurationError(format!(
                    "unknown placeholder %{{{}}} in version template '{}'",
                    name, template
                ))
            })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    if out.is_empty() || out.contains('-') || out.chars().any(char::is_whitespace) {
        return Err(Error::VersionParseError(format!(
            "version template '{}' produced unusable version '{}'",
            template, out
        )));
    }
    Ok(out)
}

/// Compiled filename pattern for url sources
#[derive(Debug, Clone)]
pub struct ArchivePattern {
    regex: Regex,
}

impl ArchivePattern {
    /// Compile a pattern; the version is taken from the `version` named
    /// group, or from the first group if there is no such name
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        if regex.captures_len() < 2 {
            return Err(Error::ConfigurationError(format!(
                "archive pattern '{}' has no capture group",
                pattern
            )));
        }
        Ok(Self { regex })
    }

    /// Extract the version token from an archive filename
    pub fn version_of(&self, filename: &str) -> Result<String> {
        let caps = self.regex.captures(filename).ok_or_else(|| {
            Error::VersionParseError(format!(
                "'{}' does not match pattern '{}'",
                filename,
                self.regex.as_str()
            ))
        })?;

        caps.name("version")
            .or_else(|| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::VersionParseError(format!("no version captured from '{}'", filename))
            })
    }
}
