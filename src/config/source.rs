//! Credential sources
//!
//! Adapters for the [`CredentialSource`] port. Operations call
//! [`CredentialSource::load`] once at their start, so edits made while an
//! operation runs are only seen by the next one.

use std::path::PathBuf;

use tracing::debug;

use super::loader::{load_config, validate_config};
use super::types::{Config, Credentials};
use crate::error::Result;
use crate::ports::CredentialSource;

/// Re-reads the settings file on every call
#[derive(Debug, Clone)]
pub struct FileCredentialSource {
    path: PathBuf,
}

impl FileCredentialSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialSource for FileCredentialSource {
    fn load(&self) -> Result<Credentials> {
        debug!(path = %self.path.display(), "Reloading router credentials");
        Ok(load_config(&self.path)?.router)
    }
}

/// Fixed credentials, validated once on construction
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// # Errors
    ///
    /// Returns an error if the credentials fail settings validation.
    pub fn new(credentials: Credentials) -> Result<Self> {
        validate_config(&Config {
            router: credentials.clone(),
            ..Default::default()
        })?;
        Ok(Self { credentials })
    }
}

impl CredentialSource for StaticCredentials {
    fn load(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}
