use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    // Local settings errors
    #[error("Settings file not found: {path}")]
    SettingsNotFound { path: String },

    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid { field: String, reason: String },

    // Input errors
    #[error("No domain names given")]
    NoDomains,

    // Transport errors
    #[error("SSH server not reachable at {host}:{port}")]
    Unreachable { host: String, port: u16 },

    #[error("SSH connection failed to {host}: {reason}")]
    SshConnection { host: String, reason: String },

    #[error("SSH authentication failed for {user}@{host}")]
    SshAuth { user: String, host: String },

    #[error("SSH command execution failed: {reason}")]
    SshExec { reason: String },

    #[error("SSH channel timeout after {seconds}s")]
    SshTimeout { seconds: u64 },

    #[error("SSH output too large (limit: {limit_bytes} bytes)")]
    SshOutputTooLarge { limit_bytes: usize },

    // Command contract errors
    #[error("SSH command failed with error: {stderr}")]
    CommandFailed { stderr: String },

    // Routing file errors
    #[error("Config file not found at: {path}")]
    ConfigNotFound { path: String },

    #[error("Rule not found: no routing rule with outboundTag '{tag}'")]
    RuleNotFound { tag: String },

    // Restart errors
    #[error("Restart process timed out after {attempts} status checks")]
    RestartTimeout { attempts: u32 },

    #[error("XKeen final status check failed. Full log:\n{output}")]
    FinalStatus { output: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // YAML errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

pub type Result<T> = std::result::Result<T, RouterError>;
