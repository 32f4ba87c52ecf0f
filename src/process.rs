// src/process.rs

//! External tool invocation
//!
//! VCS clients, the chroot build tool and the remote build service client
//! are all plain processes. Their exit status is the only success signal;
//! stderr is kept for error messages and failure classification.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

/// Render a command line for logs and error messages
pub fn display(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Build a command for `program` with `args`, optionally inside `cwd`
pub fn command<I, S>(program: &str, args: I, cwd: Option<&Path>) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd
}

/// Run a command to completion and capture its output
///
/// Only a failure to spawn is an error here; callers inspect the exit
/// status themselves.
pub fn run(cmd: &mut Command) -> Result<Output> {
    let line = display(cmd);
    debug!("Running: {}", line);

    cmd.output()
        .map_err(|e| Error::IoError(spawn_message(&line, &e)))
}

/// Run a command and return its trimmed stdout, mapping a non-zero exit
/// through `on_failure`
pub fn stdout_of<F>(cmd: &mut Command, on_failure: F) -> Result<String>
where
    F: FnOnce(String) -> Error,
{
    let output = check(cmd, on_failure)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command for its side effects
///
/// Both a tool that cannot be started and a non-zero exit are mapped
/// through `on_failure`, so the caller decides the classification.
pub fn check<F>(cmd: &mut Command, on_failure: F) -> Result<Output>
where
    F: FnOnce(String) -> Error,
{
    let line = display(cmd);
    debug!("Running: {}", line);

    let output = match cmd.output() {
        Ok(output) => output,
        Err(e) => return Err(on_failure(spawn_message(&line, &e))),
    };
    if !output.status.success() {
        return Err(on_failure(failure_message(cmd, &output)));
    }
    Ok(output)
}

fn spawn_message(line: &str, err: &std::io::Error) -> String {
    format!("failed to run '{}': {}", line, err)
}

/// "`<cmd>` exited with <status>: <stderr>"
pub fn failure_message(cmd: &Command, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("'{}' exited with {}", display(cmd), output.status)
    } else {
        format!("'{}' exited with {}: {}", display(cmd), output.status, stderr)
    }
}

/// Whether `program` can be found on `PATH`
pub fn is_available(program: &str) -> bool {
    which::which(program).is_ok()
}
