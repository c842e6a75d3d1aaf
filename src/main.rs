use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use xkeen_domains::SshRouterManager;
use xkeen_domains::cli::{
    Cli, Commands, run_add, run_list, run_remove, run_restart, run_verify,
};
use xkeen_domains::config::{FileCredentialSource, default_config_path, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries progress and results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config_path = cli.config.unwrap_or_else(default_config_path);

    info!(config = %config_path.display(), "Loading configuration");

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!(
        host = %config.router.host,
        port = config.router.port,
        tag = %config.routing.managed_outbound_tag,
        "Configuration loaded"
    );

    // Credentials are re-read from the file for every operation
    let manager = SshRouterManager::over_ssh(FileCredentialSource::new(config_path.clone()), &config);

    match cli.command {
        Commands::Verify => run_verify(&manager).await?,
        Commands::List { unsorted } => run_list(&manager, unsorted).await?,
        Commands::Add { domains } => run_add(&manager, &domains).await?,
        Commands::Remove { domains } => run_remove(&manager, &domains).await?,
        Commands::Restart => run_restart(&manager).await?,
    }

    Ok(())
}
