//! Domain module - Core business logic
//!
//! Routing document model, session lifecycle, command contracts and the
//! use cases that combine them.

pub mod executor;
pub mod gateway;
pub mod manager;
pub mod routing;
pub mod use_cases;

/// Human-readable progress sink for long-running operations
pub type ProgressFn<'a> = dyn Fn(&str) + Send + Sync + 'a;

pub use executor::CommandExecutor;
pub use gateway::SessionGateway;
pub use manager::{RouterManager, SshRouterManager};
pub use routing::{DomainEdit, Routing, RoutingConfig, Rule, parse_domain_list};
pub use use_cases::config_transaction::{ConfigTransaction, MutationReport};
pub use use_cases::restart::{
    MarkerMatcher, RestartOrchestrator, RestartReport, RestartState, StatusMatcher,
};
