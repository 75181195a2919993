mod cli;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use orchestrator::Settings;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::context::AppContext;
use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file from current directory
    dotenv().ok();

    let cli = Cli::parse();

    monitoring::init_logging().await?;

    let mut settings = Settings::from_file(&cli.config)?;
    if let Some(base_dir) = cli.base_dir {
        settings = settings.with_base_dir(base_dir);
    }
    if let Some(network) = cli.network {
        settings = settings.with_network_name(network);
    }
    info!("Using base directory {}", settings.base_dir.display());

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                println!("\n🛑 Interrupted, finishing up...");
                ctrl_c_token.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let ctx = AppContext::new(settings);

    match cli.command {
        Commands::LaunchNetwork => cli::launch::handle_launch_command(&ctx, &cancel).await,

        Commands::Infos { update } => cli::infos::handle_infos_command(&ctx, update, &cancel).await,

        Commands::TemporaryFailure { node, downtime } => {
            cli::failure::handle_temporary_failure_command(&ctx, node, downtime, &cancel).await
        }

        Commands::Scenario { scenario } => {
            cli::scenario::handle_scenario_command(&ctx, scenario).await
        }

        Commands::StopNetwork => cli::stop::handle_stop_command(&ctx).await,

        Commands::Genesis => cli::genesis::handle_genesis_command(&ctx).await,

        Commands::Docker { subcommand } => {
            cli::docker::handle_docker_command(&ctx, subcommand).await
        }

        Commands::Keypair { output, name } => {
            cli::keypair::handle_keypair_command(output, name).await
        }
    }
}
