use crate::cli::context::AppContext;
use anyhow::{Result, bail};
use domain::{Feedback, NetworkRepository, NetworkStatus};
use orchestrator::{LaunchOrchestrator, NodeConfig};
use tokio_util::sync::CancellationToken;

pub async fn handle_launch_command(ctx: &AppContext, cancel: &CancellationToken) -> Result<()> {
    if let Ok(existing) = ctx.repository.get_network(&ctx.settings.network_name).await {
        if existing.status() != NetworkStatus::Stopped {
            bail!(
                "Network {} is {}, run `devnet stop-network` first",
                existing.name,
                existing.status()
            );
        }
    }

    let runtime = ctx.docker()?;
    let orchestrator = LaunchOrchestrator::new(
        runtime,
        ctx.rpc(),
        ctx.repository.clone(),
        ctx.feedback.clone(),
        ctx.settings.clone(),
    );

    println!("🔑 Generating node identities and genesis...");
    let (mut network, configs) = orchestrator.prepare()?;
    print_roster(ctx, &configs);

    let summary = orchestrator.launch(&mut network, &configs, cancel).await?;

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🌐 Network {} is running (chain id {})", network.name, network.chain_id);
    for node in network.nodes() {
        println!(
            "   {} {:<22} {}",
            node.status().emoji(),
            node.display_name(),
            node.rpc_endpoint(&ctx.settings.rpc_host)
        );
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if !summary.unreachable.is_empty() {
        println!("⚠️  Still starting: {}", summary.unreachable.join(", "));
    }
    println!();
    println!("💡 Next steps:");
    println!("   devnet infos --update 5");
    println!("   devnet temporary-failure alice");
    Ok(())
}

fn print_roster(ctx: &AppContext, configs: &[NodeConfig]) {
    let rows: Vec<Vec<String>> = configs
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                if c.is_validator { "validator" } else { "member" }.to_string(),
                c.client.to_string(),
                c.address().to_checksum(None),
                c.peer_port.to_string(),
                c.rpc_port.to_string(),
                c.ws_port.to_string(),
            ]
        })
        .collect();
    ctx.feedback
        .display_table(&["Node", "Role", "Client", "Address", "P2P", "RPC", "WS"], &rows);
}
