//! SSH Connector Port
//!
//! This module defines traits for SSH session creation and command
//! execution, abstracting away the underlying SSH implementation for
//! testability.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::config::{Credentials, LimitsConfig};
use crate::error::Result;
use crate::ssh::CommandOutput;

/// Trait for opening authenticated SSH sessions
#[async_trait]
pub trait SshConnector: Send + Sync {
    /// The type of session returned by this connector
    type Client: SshClientTrait;

    /// Open one authenticated session to the router
    ///
    /// # Arguments
    /// * `credentials` - Router address, user and password
    /// * `limits` - Connect timeout and keepalive settings
    async fn connect(&self, credentials: &Credentials, limits: &LimitsConfig)
    -> Result<Self::Client>;
}

/// Trait for operations on an established SSH session
#[async_trait]
pub trait SshClientTrait: Send + Sync {
    /// Run one command on a fresh channel and collect both output streams
    /// once the channel has closed
    async fn exec(&self, command: &str, limits: &LimitsConfig) -> Result<CommandOutput>;

    /// Get the host name
    fn host_name(&self) -> &str;

    /// Close the session
    fn close(self) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}
