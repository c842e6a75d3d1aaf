//! XKeen Command Builder
//!
//! Builds the exact shell commands sent to the router: routing file
//! checks, reads, backups and writes, plus the `xkeen` service controls.

use std::sync::LazyLock;

use regex::Regex;

use super::shell;

/// Output of the existence check when the file is present
pub const EXISTS_MARKER: &str = "exists";

/// Line `ps` shows while a restart is in progress
pub const RESTART_PROCESS_MARKER: &str = "xkeen -restart";

/// Suffix of the backup copy written before every change
pub const BACKUP_SUFFIX: &str = ".bk";

static SAFE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[A-Za-z0-9._/+@-]+$").expect("valid regex"));

/// Validates the remote routing file path.
///
/// Paths are interpolated into commands unquoted, so only absolute paths
/// built from a conservative character set are accepted.
///
/// # Errors
///
/// Returns a human-readable reason when the path is rejected.
pub fn validate_remote_path(path: &str) -> std::result::Result<(), String> {
    if path.is_empty() {
        return Err("Config path cannot be empty".to_string());
    }
    if !path.starts_with('/') {
        return Err(format!("Config path '{path}' must be absolute"));
    }
    if !SAFE_PATH.is_match(path) {
        return Err(format!(
            "Config path '{path}' contains unsupported characters. \
             Only letters, digits and . _ / + @ - are allowed."
        ));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Config path '{path}' must not contain '..'"));
    }
    Ok(())
}

/// Builds xkeen and routing-file commands for remote execution.
pub struct XkeenCommandBuilder;

impl XkeenCommandBuilder {
    /// Constructs: `if [ -f "{path}" ]; then echo 'exists'; else echo 'not_found'; fi`
    #[must_use]
    pub fn build_exists_command(path: &str) -> String {
        format!("if [ -f \"{path}\" ]; then echo 'exists'; else echo 'not_found'; fi")
    }

    /// Constructs: `cat {path}`
    #[must_use]
    pub fn build_read_command(path: &str) -> String {
        format!("cat {path}")
    }

    /// Constructs: `cp {path} {path}.bk`
    #[must_use]
    pub fn build_backup_command(path: &str) -> String {
        format!("cp {path} {}", Self::backup_path(path))
    }

    /// Constructs: `echo '{escaped content}' > {path}`
    #[must_use]
    pub fn build_write_command(path: &str, content: &str) -> String {
        format!("echo {} > {path}", shell::escape(content))
    }

    #[must_use]
    pub const fn build_restart_command() -> &'static str {
        "xkeen -restart"
    }

    #[must_use]
    pub const fn build_process_check_command() -> &'static str {
        "ps | grep xkeen"
    }

    #[must_use]
    pub const fn build_status_command() -> &'static str {
        "xkeen -status"
    }

    #[must_use]
    pub fn backup_path(path: &str) -> String {
        format!("{path}{BACKUP_SUFFIX}")
    }
}
