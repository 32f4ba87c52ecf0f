// src/spec/mod.rs

//! Package descriptions (RPM `.spec` files)
//!
//! Only the preamble tags `Version:` and `Release:` and the `%changelog`
//! section are interpreted. Everything else is carried through edits
//! byte for byte.

mod changelog;
mod rewrite;

pub use changelog::{ChangelogEntry, ChangelogStamp};
pub use rewrite::{Rewrite, RewriteKind, SpecRewriter};

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Placeholder left in freshly scaffolded descriptions
pub const VERSION_PLACEHOLDER: &str = "@VERSION@";
pub const RELEASE_PLACEHOLDER: &str = "@RELEASE@";

/// Column at which tag values start
const TAG_VALUE_COLUMN: usize = 16;

/// A package description document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescription {
    content: String,
}

impl PackageDescription {
    pub fn parse(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::MalformedDescription(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(content))
    }

    /// Replace the file at `path` atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut temp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };
        temp.write_all(self.content.as_bytes())?;
        temp.persist(path).map_err(|e| Error::IoError(e.to_string()))?;
        Ok(())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Raw value of the `Version:` tag
    pub fn version_value(&self) -> Result<&str> {
        tag_value(&self.content, "Version")
            .ok_or_else(|| Error::MalformedDescription("no Version tag found".to_string()))
    }

    /// Raw value of the `Release:` tag
    pub fn release_value(&self) -> Result<&str> {
        tag_value(&self.content, "Release")
            .ok_or_else(|| Error::MalformedDescription("no Release tag found".to_string()))
    }

    /// Recorded version, `None` while it is still a placeholder
    pub fn version(&self) -> Result<Option<String>> {
        let value = self.version_value()?;
        if value.is_empty() || value == VERSION_PLACEHOLDER {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }

    pub fn release(&self) -> Result<Release> {
        Release::parse(self.release_value()?)
    }
}

/// Parsed `Release:` value: a counter followed by a verbatim suffix such
/// as `%{?dist}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// `None` for placeholders
    pub number: Option<u32>,
    pub suffix: String,
}

impl Release {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();

        if let Some(rest) = value.strip_prefix(RELEASE_PLACEHOLDER) {
            return Ok(Self {
                number: None,
                suffix: rest.to_string(),
            });
        }
        if value.is_empty() {
            return Ok(Self {
                number: None,
                suffix: String::new(),
            });
        }

        let digits = value.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(Error::InvalidRelease(format!(
                "'{}' does not start with a number",
                value
            )));
        }

        let number = value[..digits]
            .parse::<u32>()
            .map_err(|e| Error::InvalidRelease(format!("'{}': {}", value, e)))?;

        Ok(Self {
            number: Some(number),
            suffix: value[digits..].to_string(),
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.number.is_none()
    }

    /// Same suffix, new counter
    pub fn with_number(&self, number: u32) -> Self {
        Self {
            number: Some(number),
            suffix: self.suffix.clone(),
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(n) => write!(f, "{}{}", n, self.suffix),
            None => write!(f, "{}{}", RELEASE_PLACEHOLDER, self.suffix),
        }
    }
}

/// `Tag:` followed by padding up to the value column
pub fn format_tag_line(tag: &str, value: &str) -> String {
    let pad = TAG_VALUE_COLUMN.saturating_sub(tag.len() + 1).max(1);
    format!("{}:{}{}", tag, " ".repeat(pad), value)
}

/// Whether `line` carries `tag` (tags are case-insensitive)
pub(crate) fn is_tag_line(line: &str, tag: &str) -> bool {
    line.len() > tag.len()
        && line.as_bytes()[tag.len()] == b':'
        && line[..tag.len()].eq_ignore_ascii_case(tag)
}

fn tag_value<'a>(content: &'a str, tag: &str) -> Option<&'a str> {
    content
        .lines()
        .find(|line| is_tag_line(line, tag))
        .map(|line| line[tag.len() + 1..].trim())
}
