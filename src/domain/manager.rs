//! Router Manager
//!
//! Facade over the use cases. Credentials are fetched from the
//! [`CredentialSource`] at the start of each call, and every call runs in
//! its own SSH session.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::domain::ProgressFn;
use crate::domain::gateway::SessionGateway;
use crate::domain::use_cases::config_transaction::{ConfigTransaction, MutationReport};
use crate::domain::use_cases::restart::{RestartOrchestrator, RestartReport, StatusMatcher};
use crate::error::Result;
use crate::ports::{CredentialSource, ReachabilityProbe, Sleeper, SshConnector};
use crate::ssh::{RealSshConnector, TcpProbe};

/// Manager wired to the real russh transport and TCP probe
pub type SshRouterManager<S> = RouterManager<S, RealSshConnector, TcpProbe>;

pub struct RouterManager<S, C, P> {
    credentials: S,
    transaction: ConfigTransaction<C, P>,
    restart: RestartOrchestrator<C, P>,
}

impl<S: CredentialSource> SshRouterManager<S> {
    #[must_use]
    pub fn over_ssh(credentials: S, config: &Config) -> Self {
        Self::new(credentials, RealSshConnector::new(), TcpProbe::new(), config)
    }
}

impl<S, C, P> RouterManager<S, C, P>
where
    S: CredentialSource,
    C: SshConnector,
    P: ReachabilityProbe,
{
    pub fn new(credentials: S, connector: C, probe: P, config: &Config) -> Self {
        let gateway = Arc::new(SessionGateway::new(
            connector,
            probe,
            config.limits.clone(),
        ));
        Self {
            credentials,
            transaction: ConfigTransaction::new(
                Arc::clone(&gateway),
                config.routing.managed_outbound_tag.clone(),
            ),
            restart: RestartOrchestrator::new(gateway, config.restart.clone()),
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.restart = self.restart.with_sleeper(sleeper);
        self
    }

    #[must_use]
    pub fn with_status_matcher(mut self, matcher: Arc<dyn StatusMatcher>) -> Self {
        self.restart = self.restart.with_matcher(matcher);
        self
    }

    /// # Errors
    ///
    /// Returns an error if the credentials cannot be loaded, the router is
    /// unreachable, login fails, or the routing file is missing.
    pub async fn verify(&self) -> Result<()> {
        let credentials = self.credentials.load()?;
        info!(host = %credentials.host, "Verifying router access");
        self.transaction.verify(&credentials).await
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed. A missing
    /// managed rule yields an empty list.
    pub async fn get_domains(&self) -> Result<Vec<String>> {
        let credentials = self.credentials.load()?;
        self.transaction.get_domains(&credentials).await
    }

    /// # Errors
    ///
    /// Returns the first failing step of the edit.
    pub async fn add_domains(
        &self,
        domains: &[String],
        progress: &ProgressFn<'_>,
    ) -> Result<MutationReport> {
        let credentials = self.credentials.load()?;
        info!(host = %credentials.host, count = domains.len(), "Adding domains");
        self.transaction
            .add_domains(&credentials, domains, progress)
            .await
    }

    /// # Errors
    ///
    /// Returns the first failing step of the edit.
    pub async fn remove_domains(
        &self,
        domains: &[String],
        progress: &ProgressFn<'_>,
    ) -> Result<MutationReport> {
        let credentials = self.credentials.load()?;
        info!(host = %credentials.host, count = domains.len(), "Removing domains");
        self.transaction
            .remove_domains(&credentials, domains, progress)
            .await
    }

    /// # Errors
    ///
    /// Returns a restart timeout, a failed final status, or a transport
    /// error.
    pub async fn restart(&self, progress: &ProgressFn<'_>) -> Result<RestartReport> {
        let credentials = self.credentials.load()?;
        info!(host = %credentials.host, "Restarting XKeen");
        self.restart.restart(&credentials, progress).await
    }
}
