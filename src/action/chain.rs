// src/action/chain.rs

//! The CHAIN composite action

use super::{ActionKind, ActionResult};
use crate::package::Package;
use tracing::{debug, warn};

/// One chain step
pub type Step = (ActionKind, fn(&Package) -> ActionResult);

/// Steps CHAIN runs for `package`, in order
///
/// GET becomes UPDATE once a working copy exists; UPLOAD is only part of
/// the chain when an uploader is configured.
pub fn chain_steps(package: &Package) -> Vec<Step> {
    let mut steps: Vec<Step> = Vec::with_capacity(5);
    if package.source.working_copy_exists() {
        steps.push((ActionKind::Update, super::update));
    } else {
        steps.push((ActionKind::Get, super::get));
    }
    steps.push((ActionKind::Construct, super::construct));
    steps.push((ActionKind::Build, super::build));
    steps.push((ActionKind::Export, super::export));
    if !package.uploader.is_none() {
        steps.push((ActionKind::Upload, super::upload));
    }
    steps
}

/// Results of the steps that ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub steps: Vec<ActionResult>,
}

impl ChainReport {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|r| r.succeeded)
    }

    /// The step that stopped the chain
    pub fn failure(&self) -> Option<&ActionResult> {
        self.steps.iter().find(|r| !r.succeeded)
    }

    pub fn executed(&self) -> Vec<ActionKind> {
        self.steps.iter().map(|r| r.action).collect()
    }

    /// Collapse into the result of the CHAIN action itself
    pub fn into_result(self) -> ActionResult {
        let executed: Vec<&str> = self.steps.iter().map(|r| r.action.as_str()).collect();
        match self.failure() {
            Some(failed) => ActionResult {
                action: ActionKind::Chain,
                succeeded: false,
                reason: failed.reason,
                message: format!("stopped at {}: {}", failed.action, failed.message),
            },
            None => ActionResult::success(
                ActionKind::Chain,
                format!("completed {}", executed.join(" -> ")),
            ),
        }
    }
}

/// Run the chain for `package`, stopping at the first failing step
///
/// Effects of earlier steps stay in place.
pub fn run_chain(package: &Package) -> ChainReport {
    run_steps(package, chain_steps(package))
}

pub(crate) fn run_steps(package: &Package, steps: Vec<Step>) -> ChainReport {
    let steps = steps
        .into_iter()
        .try_fold(Vec::new(), |mut done, (kind, op)| {
            debug!("{}: chain step {}", package.id, kind);
            let result = op(package);
            let failed = !result.succeeded;
            done.push(result);
            if failed {
                warn!("{}: chain stopped at {}", package.id, kind);
                Err(done)
            } else {
                Ok(done)
            }
        })
        .unwrap_or_else(|done| done);

    ChainReport { steps }
}
