//! Ports module - Trait definitions for hexagonal architecture
//!
//! This module contains the trait definitions (ports) that define
//! the boundaries between the domain logic and external adapters.

mod connector;
mod credentials;
mod probe;
mod sleeper;

pub use connector::{SshClientTrait, SshConnector};
pub use credentials::CredentialSource;
pub use probe::ReachabilityProbe;
pub use sleeper::{Sleeper, TokioSleeper};

#[cfg(test)]
pub use connector::mock::{MockSshClient, MockSshConnector};
#[cfg(test)]
pub use probe::mock::MockProbe;
#[cfg(test)]
pub use sleeper::mock::RecordingSleeper;
