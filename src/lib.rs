// src/lib.rs

//! Centaur packaging automation
//!
//! Keeps downstream packages in step with their upstream projects: fetch
//! sources, derive a canonical version, rewrite the package description,
//! build in a chroot and hand the results to a remote build service.
//!
//! # Architecture
//!
//! - Packages: one TOML file per package selects a source, builder and uploader
//! - Sources: git, bzr, url, local and none, behind one closed enum
//! - Descriptions: version and release bumps with changelog entries
//! - Actions: every operation reports a classified result instead of failing
//! - Chain: GET/UPDATE, CONSTRUCT, BUILD, EXPORT and UPLOAD in one pass

pub mod action;
pub mod builder;
pub mod config;
mod error;
pub mod package;
pub mod process;
pub mod source;
pub mod spec;
pub mod state;
pub mod uploader;
pub mod version;

pub use action::{ActionKind, ActionResult, ChainReport, StatusReport};
pub use config::Config;
pub use error::{Error, ErrorKind, Result, UploadFailureKind};
pub use package::{Package, PackageFile};
pub use source::{Source, SourceOutcome};
pub use version::VersionFingerprint;
