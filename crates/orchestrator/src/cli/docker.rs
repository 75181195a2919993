use crate::cli::DockerCommands;
use crate::cli::context::AppContext;
use anyhow::Result;
use domain::{ContainerRuntime, Feedback};

pub async fn handle_docker_command(ctx: &AppContext, subcommand: DockerCommands) -> Result<()> {
    match subcommand {
        DockerCommands::Check => {
            println!("🐳 Checking Docker daemon...");
            let docker = ctx.docker()?;

            if let Err(e) = docker.ping().await {
                eprintln!("❌ Docker is not reachable: {}", e);
                return Err(e.into());
            }
            let version = docker.server_version().await?;
            println!("✅ Docker {} is available", version);

            let containers = docker.list_managed_containers().await?;
            if containers.is_empty() {
                println!("   No devnet containers");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = containers
                .into_iter()
                .map(|(id, name, running)| {
                    vec![
                        name,
                        id.chars().take(12).collect(),
                        if running { "running" } else { "stopped" }.to_string(),
                    ]
                })
                .collect();
            ctx.feedback.display_table(&["Container", "ID", "State"], &rows);
        }
    }
    Ok(())
}
