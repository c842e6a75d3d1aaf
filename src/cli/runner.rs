//! CLI runner functions
//!
//! Thin wrappers that call one manager operation and print the outcome.
//! Progress lines go to stdout as they arrive; logs go to stderr.

use std::fmt::Write as FmtWrite;

use tracing::info;

use crate::domain::{MutationReport, RestartReport, RouterManager, parse_domain_list};
use crate::error::{Result, RouterError};
use crate::ports::{CredentialSource, ReachabilityProbe, SshConnector};

fn print_progress(message: &str) {
    println!("{message}");
}

/// Split every argument on commas and whitespace and drop duplicates,
/// keeping first-seen order.
///
/// # Errors
///
/// Returns [`RouterError::NoDomains`] if nothing usable remains.
pub fn expand_domain_args(args: &[String]) -> Result<Vec<String>> {
    let mut domains: Vec<String> = Vec::new();
    for domain in args.iter().flat_map(|arg| parse_domain_list(arg)) {
        if !domains.contains(&domain) {
            domains.push(domain);
        }
    }
    if domains.is_empty() {
        return Err(RouterError::NoDomains);
    }
    Ok(domains)
}

fn format_domain_list(mut domains: Vec<String>, sorted: bool) -> String {
    if domains.is_empty() {
        return "No domains in the managed rule.".to_string();
    }
    if sorted {
        domains.sort();
    }
    let mut out = String::new();
    for domain in &domains {
        let _ = writeln!(out, "{domain}");
    }
    let _ = write!(out, "\n{} domain(s)", domains.len());
    out
}

fn format_mutation(verb: &str, report: &MutationReport) -> String {
    format!(
        "{verb} {} domain(s); the managed rule now has {}. Backup: {}",
        report.changed,
        report.domains.len(),
        report.backup_path
    )
}

fn format_restart(report: &RestartReport) -> String {
    format!(
        "XKeen restarted after {} status check(s).\n\n{}",
        report.polls, report.status
    )
}

/// Check reachability, login and routing file presence
///
/// # Errors
///
/// Returns an error if any of the checks fails.
pub async fn run_verify<S, C, P>(manager: &RouterManager<S, C, P>) -> Result<()>
where
    S: CredentialSource,
    C: SshConnector,
    P: ReachabilityProbe,
{
    manager.verify().await?;
    println!("Connection OK, routing file found.");
    Ok(())
}

/// Print the managed rule's domains, sorted unless `unsorted` is set
///
/// # Errors
///
/// Returns an error if the routing file cannot be read or parsed.
pub async fn run_list<S, C, P>(manager: &RouterManager<S, C, P>, unsorted: bool) -> Result<()>
where
    S: CredentialSource,
    C: SshConnector,
    P: ReachabilityProbe,
{
    let domains = manager.get_domains().await?;
    info!(count = domains.len(), "Fetched domain list");
    println!("{}", format_domain_list(domains, !unsorted));
    Ok(())
}

/// # Errors
///
/// Returns an error if no domain is given or the edit fails.
pub async fn run_add<S, C, P>(manager: &RouterManager<S, C, P>, args: &[String]) -> Result<()>
where
    S: CredentialSource,
    C: SshConnector,
    P: ReachabilityProbe,
{
    let domains = expand_domain_args(args)?;
    let report = manager.add_domains(&domains, &print_progress).await?;
    println!("{}", format_mutation("Added", &report));
    Ok(())
}

/// # Errors
///
/// Returns an error if no domain is given or the edit fails.
pub async fn run_remove<S, C, P>(manager: &RouterManager<S, C, P>, args: &[String]) -> Result<()>
where
    S: CredentialSource,
    C: SshConnector,
    P: ReachabilityProbe,
{
    let domains = expand_domain_args(args)?;
    let report = manager.remove_domains(&domains, &print_progress).await?;
    println!("{}", format_mutation("Removed", &report));
    Ok(())
}

/// # Errors
///
/// Returns an error if the restart does not settle or the final status is
/// not running.
pub async fn run_restart<S, C, P>(manager: &RouterManager<S, C, P>) -> Result<()>
where
    S: CredentialSource,
    C: SshConnector,
    P: ReachabilityProbe,
{
    let report = manager.restart(&print_progress).await?;
    println!("{}", format_restart(&report));
    Ok(())
}
