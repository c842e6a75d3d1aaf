//! Command Executor
//!
//! Two contracts over one execution primitive:
//! - tolerant ([`CommandExecutor::run_logged`]): error-stream text is folded
//!   into the returned text, for commands whose output is inspected as prose
//! - strict ([`CommandExecutor::run_strict`]): any error-stream text fails the
//!   call, for commands whose output is parsed as data

use tracing::debug;

use crate::config::LimitsConfig;
use crate::error::{Result, RouterError};
use crate::ports::SshClientTrait;
use crate::ssh::CommandOutput;

/// Returned by the tolerant contract when a command printed nothing
pub const NO_OUTPUT: &str = "Command executed, but produced no output.";

/// Header separating the error stream in tolerant output
pub const STDERR_HEADER: &str = "--- STDERR ---";

#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    limits: LimitsConfig,
}

impl CommandExecutor {
    #[must_use]
    pub const fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    #[must_use]
    pub const fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Run `command` and return its output, never failing on error text or
    /// exit status.
    ///
    /// # Errors
    ///
    /// Only transport failures (channel open, channel I/O) are returned.
    pub async fn run_logged<S: SshClientTrait>(&self, session: &S, command: &str) -> Result<String> {
        let output = self.run(session, command).await?;
        Ok(format_logged(&output))
    }

    /// Run `command` and return its standard output.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::CommandFailed`] carrying the error stream
    /// verbatim if it is non-empty, or a transport error.
    pub async fn run_strict<S: SshClientTrait>(&self, session: &S, command: &str) -> Result<String> {
        let output = self.run(session, command).await?;
        if !output.stderr.is_empty() {
            return Err(RouterError::CommandFailed {
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }

    async fn run<S: SshClientTrait>(&self, session: &S, command: &str) -> Result<CommandOutput> {
        debug!(host = %session.host_name(), command = %summarize(command), "Executing command");
        let output = session.exec(command, &self.limits).await?;
        debug!(
            host = %session.host_name(),
            exit_code = output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Command finished"
        );
        Ok(output)
    }
}

/// Tolerant rendering: stdout, then a delimited stderr section, or
/// [`NO_OUTPUT`] when both are blank.
#[must_use]
pub fn format_logged(output: &CommandOutput) -> String {
    let mut text = String::new();
    if !output.stdout.trim().is_empty() {
        text.push_str(&output.stdout);
    }
    if !output.stderr.trim().is_empty() {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(STDERR_HEADER);
        text.push('\n');
        text.push_str(&output.stderr);
    }
    if text.is_empty() {
        NO_OUTPUT.to_string()
    } else {
        text
    }
}

/// Write commands embed the whole routing file; keep debug logs short.
fn summarize(command: &str) -> String {
    const MAX: usize = 120;
    if command.len() <= MAX {
        return command.to_string();
    }
    let cut = (0..=MAX)
        .rev()
        .find(|&i| command.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}... ({} bytes)", &command[..cut], command.len())
}
