//! Restart Use Case
//!
//! `xkeen -restart` returns before the service is back, and the router
//! sends no notification when it is. The orchestrator therefore polls the
//! process table until the restart process disappears (or the poll ceiling
//! is hit), then confirms with `xkeen -status`.
//!
//! ```text
//! Issued -> Polling -> Settled  -> FinalCheck -> Done
//!                   \-> TimedOut (error)     \-> error
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::xkeen::{RESTART_PROCESS_MARKER, XkeenCommandBuilder};
use crate::config::{Credentials, RestartConfig};
use crate::domain::ProgressFn;
use crate::domain::executor::CommandExecutor;
use crate::domain::gateway::SessionGateway;
use crate::error::{Result, RouterError};
use crate::ports::{ReachabilityProbe, Sleeper, SshClientTrait, SshConnector, TokioSleeper};

/// Decides from `xkeen -status` output whether the service is running
pub trait StatusMatcher: Send + Sync {
    fn is_running(&self, status: &str) -> bool;
}

impl<F> StatusMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_running(&self, status: &str) -> bool {
        self(status)
    }
}

/// Substring matcher. XKeen prints `xkeen запущен` when running and
/// `xkeen не запущен` when not, so the stopped marker is checked first.
#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    running: String,
    stopped: String,
}

impl MarkerMatcher {
    #[must_use]
    pub fn new(running: impl Into<String>, stopped: impl Into<String>) -> Self {
        Self {
            running: running.into(),
            stopped: stopped.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &RestartConfig) -> Self {
        Self::new(&config.running_marker, &config.stopped_marker)
    }
}

impl StatusMatcher for MarkerMatcher {
    fn is_running(&self, status: &str) -> bool {
        if !self.stopped.is_empty() && status.contains(&self.stopped) {
            return false;
        }
        status.contains(&self.running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartState {
    Issued,
    Polling,
    Settled,
    TimedOut,
    FinalCheck,
    Done,
}

/// Outcome of a successful restart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartReport {
    /// Process-table checks performed before the restart settled
    pub polls: u32,
    /// Full `xkeen -status` text
    pub status: String,
}

pub struct RestartOrchestrator<C, P> {
    gateway: Arc<SessionGateway<C, P>>,
    executor: CommandExecutor,
    config: RestartConfig,
    sleeper: Arc<dyn Sleeper>,
    matcher: Arc<dyn StatusMatcher>,
}

impl<C: SshConnector, P: ReachabilityProbe> RestartOrchestrator<C, P> {
    pub fn new(gateway: Arc<SessionGateway<C, P>>, config: RestartConfig) -> Self {
        let executor = CommandExecutor::new(gateway.limits().clone());
        let matcher = Arc::new(MarkerMatcher::from_config(&config));
        Self {
            gateway,
            executor,
            config,
            sleeper: Arc::new(TokioSleeper),
            matcher,
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn StatusMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Restart XKeen and wait for it to come back.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::RestartTimeout`] when the restart process is
    /// still listed after `max_polls` checks, [`RouterError::FinalStatus`]
    /// when the status text does not report a running service, or any
    /// transport error.
    pub async fn restart(
        &self,
        credentials: &Credentials,
        progress: &ProgressFn<'_>,
    ) -> Result<RestartReport> {
        self.gateway
            .with_session(credentials, async |session| {
                self.run(session, progress).await
            })
            .await
    }

    async fn run<S: SshClientTrait>(&self, session: &S, progress: &ProgressFn<'_>) -> Result<RestartReport> {
        let max_polls = self.config.max_polls;
        let mut polls = 0u32;
        let mut status = String::new();
        let mut state = RestartState::Issued;

        loop {
            debug!(?state, polls, "Restart state");
            state = match state {
                RestartState::Issued => {
                    let command = XkeenCommandBuilder::build_restart_command();
                    progress(&format!("Executing: {command}"));
                    let output = self.executor.run_logged(session, command).await?;
                    debug!(output = %output, "Restart issued");
                    RestartState::Polling
                }
                RestartState::Polling if polls >= max_polls => RestartState::TimedOut,
                RestartState::Polling => {
                    self.sleeper.sleep(self.config.poll_interval()).await;
                    polls += 1;
                    progress(&format!("Checking status ({polls}/{max_polls})..."));
                    let processes = self
                        .executor
                        .run_logged(session, XkeenCommandBuilder::build_process_check_command())
                        .await?;
                    if processes.contains(RESTART_PROCESS_MARKER) {
                        progress("XKeen is still restarting...");
                        RestartState::Polling
                    } else {
                        RestartState::Settled
                    }
                }
                RestartState::TimedOut => {
                    warn!(attempts = max_polls, "Restart did not settle");
                    return Err(RouterError::RestartTimeout {
                        attempts: max_polls,
                    });
                }
                RestartState::Settled => {
                    progress("Restart process finished. Checking final status...");
                    RestartState::FinalCheck
                }
                RestartState::FinalCheck => {
                    status = self
                        .executor
                        .run_logged(session, XkeenCommandBuilder::build_status_command())
                        .await?;
                    if !self.matcher.is_running(&status) {
                        warn!(status = %status, "XKeen not running after restart");
                        return Err(RouterError::FinalStatus { output: status });
                    }
                    progress("Final status check successful.");
                    RestartState::Done
                }
                RestartState::Done => {
                    info!(polls, "XKeen restarted");
                    return Ok(RestartReport { polls, status });
                }
            };
        }
    }
}
