// src/spec/changelog.rs

//! `%changelog` entries

use chrono::NaiveDate;
use std::fmt;

/// Marker opening the changelog section
pub const CHANGELOG_MARKER: &str = "%changelog";

/// Who and when, for a new changelog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogStamp {
    pub date: NaiveDate,
    pub packager: String,
}

impl ChangelogStamp {
    pub fn new(date: NaiveDate, packager: impl Into<String>) -> Self {
        Self {
            date,
            packager: packager.into(),
        }
    }

    /// Stamp for today in local time
    pub fn today(packager: impl Into<String>) -> Self {
        Self::new(chrono::Local::now().date_naive(), packager)
    }
}

/// One changelog entry, newest entries go first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub stamp: ChangelogStamp,
    /// `<version>-<release>` as written to the description
    pub evr: String,
    pub note: String,
}

impl fmt::Display for ChangelogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "* {} {} - {}",
            self.stamp.date.format("%a %b %d %Y"),
            self.stamp.packager,
            self.evr
        )?;
        writeln!(f, "- {}", self.note)?;
        writeln!(f)
    }
}

/// Insert `entry` right below the changelog marker, or append a new
/// changelog section when there is none
pub fn insert_entry(lines: &mut Vec<String>, entry: &ChangelogEntry) {
    let text = entry.to_string();
    let entry_lines = text.trim_end_matches('\n').split('\n').map(String::from);
    // entries are separated by one blank line
    let entry_lines: Vec<String> = entry_lines.chain(std::iter::once(String::new())).collect();

    match lines.iter().position(|l| l.trim_end() == CHANGELOG_MARKER) {
        Some(idx) => {
            lines.splice(idx + 1..idx + 1, entry_lines);
        }
        None => {
            // keep the trailing empty element produced by a final newline last
            let trailing_newline = lines.last().is_some_and(|l| l.is_empty());
            if trailing_newline {
                lines.pop();
            }
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            lines.push(CHANGELOG_MARKER.to_string());
            lines.extend(entry_lines);
            lines.push(String::new());
        }
    }
}
