//! External command execution with a declared failure policy.
//!
//! Every call site states up front whether the step must succeed or is
//! best-effort, and passes the complete environment the subprocess sees.
//! Nothing is inherited from the installer's own environment, so a step
//! cannot leak an env change into a later one.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use opal_core::Error;

/// What a non-zero exit means for the install run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecPolicy {
    /// Failure aborts the whole installer. Used for steps later steps
    /// depend on (downloads, package installs, database tooling).
    MustSucceed,
    /// Failure is logged and the run continues. Used for cosmetic steps
    /// only; never for prerequisites.
    BestEffort,
}

/// Explicit, immutable environment for one subprocess invocation.
#[derive(Debug, Clone, Default)]
pub struct CmdEnv {
    vars: Vec<(String, String)>,
}

impl CmdEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any earlier value for the same key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.vars.retain(|(k, _)| *k != key);
        self.vars.push((key, value.into()));
        self
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Execute a command, capturing output. Logs a human-friendly description at
/// info level and the full command line at debug level.
///
/// Returns captured stdout (trimmed). Under `BestEffort`, a failed or even
/// unspawnable command logs a warning and yields whatever stdout there was.
pub fn run_cmd(
    description: &str,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    env: &CmdEnv,
    policy: ExecPolicy,
) -> Result<String> {
    let cmd_line = format!("{program} {}", args.join(" "));
    tracing::info!("{description}");
    tracing::debug!("exec: {cmd_line}");

    let mut command = Command::new(program);
    command.args(args).env_clear().envs(env.vars());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = match command.output() {
        Ok(output) => output,
        Err(e) => match policy {
            ExecPolicy::MustSucceed => {
                return Err(e).with_context(|| format!("failed to execute: {cmd_line}"));
            }
            ExecPolicy::BestEffort => {
                tracing::warn!("{description}: could not execute {cmd_line}: {e}");
                return Ok(String::new());
            }
        },
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        match policy {
            ExecPolicy::MustSucceed => {
                tracing::error!("command failed: {cmd_line}\nstderr: {stderr}");
                return Err(Error::CommandFailed {
                    description: description.to_string(),
                    code: output.status.code(),
                }
                .into());
            }
            ExecPolicy::BestEffort => {
                tracing::warn!(
                    "{description} failed (exit {}), continuing\nstdout: {stdout}\nstderr: {stderr}",
                    output.status
                );
            }
        }
    }
    Ok(stdout)
}

/// Check whether a program exists on PATH.
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .output()
        .is_ok_and(|o| o.status.success())
}
