//! SSH Connector Adapter
//!
//! Concrete implementation of the `SshConnector` and `SshClientTrait` ports
//! using the russh SSH client.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::config::{Credentials, LimitsConfig};
use crate::error::Result;
use crate::ports::{SshClientTrait, SshConnector};
use crate::ssh::{CommandOutput, SshClient};

/// Real SSH connector using russh
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSshConnector;

impl RealSshConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SshConnector for RealSshConnector {
    type Client = SshClient;

    async fn connect(
        &self,
        credentials: &Credentials,
        limits: &LimitsConfig,
    ) -> Result<Self::Client> {
        SshClient::connect(credentials, limits).await
    }
}

#[async_trait]
impl SshClientTrait for SshClient {
    async fn exec(&self, command: &str, limits: &LimitsConfig) -> Result<CommandOutput> {
        self.exec(command, limits).await
    }

    fn host_name(&self) -> &str {
        self.host_name()
    }

    fn close(self) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move { self.close().await })
    }
}
