//! Credential Source Port

use crate::config::Credentials;
use crate::error::Result;

/// Supplies router credentials, fetched anew at the start of every
/// operation
pub trait CredentialSource: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the credentials cannot be loaded or are invalid.
    fn load(&self) -> Result<Credentials>;
}
