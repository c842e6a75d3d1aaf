use super::types::Config;
use crate::domain::use_cases::xkeen::validate_remote_path;
use crate::error::{RouterError, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Load settings from a YAML file
///
/// # Errors
///
/// Returns an error if:
/// - The settings file does not exist
/// - The file cannot be read
/// - The YAML content is invalid or cannot be parsed
/// - The settings fail validation (empty host, unsafe config path, ...)
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(RouterError::SettingsNotFound {
            path: path.display().to_string(),
        });
    }

    // Warn if the settings file has overly permissive permissions (it holds a password)
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            let mode = metadata.mode() & 0o777;
            if mode & 0o037 != 0 {
                warn!(
                    config_path = %path.display(),
                    permissions = format!("{mode:04o}"),
                    "Settings file contains the router password and has permissive permissions. \
                     Consider: chmod 640 {}",
                    path.display()
                );
            }
        }
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_saphyr::from_str(&content)?;

    validate_config(&config)?;
    debug!(config_path = %path.display(), host = %config.router.host, "Settings loaded");

    Ok(config)
}

/// Validate the settings
pub(crate) fn validate_config(config: &Config) -> Result<()> {
    let router = &config.router;

    if router.host.trim().is_empty() {
        return Err(RouterError::ConfigInvalid {
            field: "router.host".to_string(),
            reason: "Host cannot be empty".to_string(),
        });
    }

    if router.port == 0 {
        return Err(RouterError::ConfigInvalid {
            field: "router.port".to_string(),
            reason: "Port must be between 1 and 65535".to_string(),
        });
    }

    if router.user.trim().is_empty() {
        return Err(RouterError::ConfigInvalid {
            field: "router.user".to_string(),
            reason: "User cannot be empty".to_string(),
        });
    }

    validate_remote_path(&router.config_path).map_err(|reason| RouterError::ConfigInvalid {
        field: "router.config_path".to_string(),
        reason,
    })?;

    if config.restart.max_polls == 0 {
        return Err(RouterError::ConfigInvalid {
            field: "restart.max_polls".to_string(),
            reason: "At least one status check is required".to_string(),
        });
    }

    if config.restart.poll_interval_ms == 0 {
        return Err(RouterError::ConfigInvalid {
            field: "restart.poll_interval_ms".to_string(),
            reason: "Poll interval cannot be zero".to_string(),
        });
    }

    if config.limits.channel_poll_interval_ms == 0 {
        return Err(RouterError::ConfigInvalid {
            field: "limits.channel_poll_interval_ms".to_string(),
            reason: "Poll interval cannot be zero".to_string(),
        });
    }

    if config.restart.running_marker.is_empty() {
        return Err(RouterError::ConfigInvalid {
            field: "restart.running_marker".to_string(),
            reason: "Marker cannot be empty".to_string(),
        });
    }

    if config.routing.managed_outbound_tag.trim().is_empty() {
        return Err(RouterError::ConfigInvalid {
            field: "routing.managed_outbound_tag".to_string(),
            reason: "Outbound tag cannot be empty".to_string(),
        });
    }

    Ok(())
}

/// Get the default settings path
#[must_use]
pub fn default_config_path() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("xkeen-domains")
        .join("config.yaml")
}
