//! CLI module for direct command-line usage
//!
//! Each subcommand maps onto one [`crate::domain::RouterManager`]
//! operation, so each invocation opens exactly one SSH session.

mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use runner::{expand_domain_args, run_add, run_list, run_remove, run_restart, run_verify};

/// XKeen domain manager - edit the proxied domain list on a Keenetic router
#[derive(Parser)]
#[command(name = "xkeen-domains")]
#[command(about = "Manage the XKeen proxied domain list over SSH")]
#[command(version)]
#[command(after_help = "EXAMPLES:
    # Check that the router answers and the routing file exists
    xkeen-domains verify

    # Show proxied domains
    xkeen-domains list

    # Add domains (space or comma separated)
    xkeen-domains add example.com \"youtube.com, googlevideo.com\"

    # Remove a domain
    xkeen-domains remove example.com

    # Restart XKeen and wait for it to come back
    xkeen-domains restart")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check reachability, login and routing file presence
    Verify,

    /// List domains routed through the managed outbound
    List {
        /// Keep file order instead of sorting
        #[arg(long)]
        unsorted: bool,
    },

    /// Add domains to the managed rule
    Add {
        /// Domains; each argument may itself be comma separated
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Remove domains from the managed rule
    Remove {
        /// Domains; each argument may itself be comma separated
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Restart XKeen and wait until it reports running
    Restart,
}
