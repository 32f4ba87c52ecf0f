// src/error.rs

//! Error types for Centaur
//!
//! Every failure inside the library is an [`Error`]. Actions never let an
//! `Error` escape: they fold it into an [`ErrorKind`] carried by the
//! action result, so the chain can decide whether to continue.

use std::fmt;
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Why an upload was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadFailureKind {
    /// Missing or rejected credentials
    Authentication,
    /// The remote service could not be reached
    Network,
    /// The service accepted the request but refused the artifact
    Rejected,
}

impl UploadFailureKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Network => "network",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for UploadFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Cannot derive version: {0}")]
    VersionParseError(String),

    #[error("Malformed package description: {0}")]
    MalformedDescription(String),

    #[error("Invalid release: {0}")]
    InvalidRelease(String),

    #[error("Build failed: {0}")]
    BuildFailure(String),

    #[error("Upload failed ({kind}): {message}")]
    UploadFailure {
        kind: UploadFailureKind,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl Error {
    /// Shorthand for an upload failure of the given kind
    pub fn upload(kind: UploadFailureKind, message: impl Into<String>) -> Self {
        Self::UploadFailure {
            kind,
            message: message.into(),
        }
    }

    /// Classify this error for reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Self::DownloadError(_) => ErrorKind::DownloadError,
            Self::VersionParseError(_) => ErrorKind::VersionParseError,
            Self::MalformedDescription(_) => ErrorKind::MalformedDescription,
            Self::InvalidRelease(_) => ErrorKind::InvalidRelease,
            Self::BuildFailure(_) => ErrorKind::BuildFailure,
            Self::UploadFailure { kind, .. } => ErrorKind::UploadFailure(*kind),
            Self::ConfigurationError(_) => ErrorKind::ConfigurationError,
            Self::IoError(_) => ErrorKind::Io,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::ConfigurationError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::IoError(format!("state file: {e}"))
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Self::ConfigurationError(format!("invalid pattern: {e}"))
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Classification of an action result, as shown to the user
///
/// `AlreadyExists` is the one classification carried by a successful
/// result: fetching sources that are already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceUnavailable,
    DownloadError,
    VersionParseError,
    MalformedDescription,
    InvalidRelease,
    BuildFailure,
    UploadFailure(UploadFailureKind),
    ConfigurationError,
    AlreadyExists,
    Io,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SourceUnavailable => "SourceUnavailable",
            Self::DownloadError => "DownloadError",
            Self::VersionParseError => "VersionParseError",
            Self::MalformedDescription => "MalformedDescription",
            Self::InvalidRelease => "InvalidRelease",
            Self::BuildFailure => "BuildFailure",
            Self::UploadFailure(_) => "UploadFailure",
            Self::ConfigurationError => "ConfigurationError",
            Self::AlreadyExists => "AlreadyExists",
            Self::Io => "IoError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UploadFailure(kind) => write!(f, "UploadFailure({kind})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
