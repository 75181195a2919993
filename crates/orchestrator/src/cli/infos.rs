use crate::cli::context::AppContext;
use anyhow::{Result, bail};
use orchestrator::NetworkMonitor;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn handle_infos_command(
    ctx: &AppContext,
    update: Option<u64>,
    cancel: &CancellationToken,
) -> Result<()> {
    // Fail early with a hint when nothing was launched
    let mut network = ctx.load_network().await?;

    let monitor = NetworkMonitor::new(
        ctx.docker()?,
        ctx.rpc(),
        ctx.repository.clone(),
        ctx.feedback.clone(),
        ctx.settings.rpc_host.clone(),
    );

    match update {
        None => {
            monitor.report(&mut network).await;
        }
        Some(0) => bail!("--update must be at least 1 second"),
        Some(secs) => {
            println!("🔄 Refreshing every {}s, press Ctrl-C to stop", secs);
            monitor
                .run_continuous(&network.name, Duration::from_secs(secs), cancel)
                .await;
        }
    }
    Ok(())
}
