//! Reachability Probe Port
//!
//! A cheap pre-flight check run before any SSH session is opened.

use std::time::Duration;

use async_trait::async_trait;

/// Trait for transport-level reachability checks
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Returns `true` iff a connection to `host:port` completes within
    /// `timeout`. Never fails: refusal, timeout and resolution errors all
    /// yield `false`.
    async fn probe(&self, host: &str, port: u16, timeout: Duration) -> bool;
}
