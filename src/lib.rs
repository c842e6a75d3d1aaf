#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod ssh;

pub use config::Config;
pub use domain::{MutationReport, RestartReport, RouterManager, SshRouterManager};
pub use error::{Result, RouterError};
pub use ports::{CredentialSource, ReachabilityProbe, Sleeper, SshClientTrait, SshConnector};
