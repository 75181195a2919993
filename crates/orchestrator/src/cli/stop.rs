use crate::cli::context::AppContext;
use anyhow::Result;
use orchestrator::NetworkTeardown;

pub async fn handle_stop_command(ctx: &AppContext) -> Result<()> {
    let mut network = ctx.load_network().await?;

    let teardown = NetworkTeardown::new(
        ctx.docker()?,
        ctx.repository.clone(),
        ctx.feedback.clone(),
        ctx.settings.docker_network.clone(),
    );
    let summary = teardown.stop_network(&mut network).await?;

    if summary.failed.is_empty() {
        println!("✅ Network {} stopped", network.name);
    } else {
        println!(
            "⚠️  Network {} stopped, containers left behind for: {}",
            network.name,
            summary.failed.join(", ")
        );
    }
    Ok(())
}
