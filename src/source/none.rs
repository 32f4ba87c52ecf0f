// src/source/none.rs

//! Packages without upstream code

use super::{SourceContext, SourceOutcome};
use crate::error::Result;
use std::path::PathBuf;

/// Source for packages built from the description alone
///
/// The working copy is just the package's source directory, so that build
/// artefacts and patches placed there by hand have a home.
#[derive(Debug, Clone)]
pub struct NoSource {
    ctx: SourceContext,
}

impl NoSource {
    pub fn new(ctx: SourceContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SourceContext {
        &self.ctx
    }

    pub fn origin(&self) -> Option<&str> {
        None
    }

    pub fn working_copy(&self) -> PathBuf {
        self.ctx.dir.clone()
    }

    pub fn get(&self) -> Result<SourceOutcome> {
        if self.ctx.dir.exists() {
            return Ok(SourceOutcome::AlreadyExists);
        }
        self.ctx.ensure_dir()?;
        Ok(SourceOutcome::Created)
    }

    pub fn update(&self) -> Result<SourceOutcome> {
        Ok(SourceOutcome::Unchanged)
    }

    pub fn export(&self) -> Result<Option<PathBuf>> {
        Ok(None)
    }

    pub fn formatver(&self) -> Result<String> {
        Ok(self.ctx.version.clone())
    }

    pub fn rev(&self) -> Option<String> {
        None
    }

    pub fn date(&self) -> Option<String> {
        None
    }

    pub fn verify(&self) -> Result<()> {
        Ok(())
    }
}
