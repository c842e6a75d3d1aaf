//! Session Gateway
//!
//! Every public operation runs inside exactly one SSH session opened here:
//! reachability probe first, then connect, then the operation body, then an
//! unconditional disconnect.

use tracing::{info, warn};

use crate::config::{Credentials, LimitsConfig};
use crate::error::{Result, RouterError};
use crate::ports::{ReachabilityProbe, SshClientTrait, SshConnector};

pub struct SessionGateway<C, P> {
    connector: C,
    probe: P,
    limits: LimitsConfig,
}

impl<C: SshConnector, P: ReachabilityProbe> SessionGateway<C, P> {
    pub const fn new(connector: C, probe: P, limits: LimitsConfig) -> Self {
        Self {
            connector,
            probe,
            limits,
        }
    }

    #[must_use]
    pub const fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Run `body` inside a fresh session.
    ///
    /// The session is closed on every path once `body` has been invoked;
    /// a close failure is logged and never replaces the body's outcome.
    ///
    /// # Errors
    ///
    /// Returns the first failure: [`RouterError::Unreachable`] when the
    /// probe fails (no session is attempted), the connect/auth error, or
    /// the body's own error.
    pub async fn with_session<T, F>(&self, credentials: &Credentials, body: F) -> Result<T>
    where
        F: AsyncFnOnce(&C::Client) -> Result<T>,
    {
        let reachable = self
            .probe
            .probe(
                &credentials.host,
                credentials.port,
                self.limits.probe_timeout(),
            )
            .await;
        if !reachable {
            warn!(host = %credentials.host, port = credentials.port, "SSH server not reachable");
            return Err(RouterError::Unreachable {
                host: credentials.host.clone(),
                port: credentials.port,
            });
        }

        let session = self.connector.connect(credentials, &self.limits).await?;
        info!(host = %session.host_name(), user = %credentials.user, "SSH session opened");

        let result = body(&session).await;

        let host = session.host_name().to_string();
        match session.close().await {
            Ok(()) => info!(host = %host, "SSH session closed"),
            Err(e) => warn!(host = %host, error = %e, "Failed to close SSH session cleanly"),
        }

        result
    }
}
