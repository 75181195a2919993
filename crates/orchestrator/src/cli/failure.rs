use crate::cli::context::AppContext;
use anyhow::Result;
use orchestrator::{FailureInjector, NodeLockManager};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn handle_temporary_failure_command(
    ctx: &AppContext,
    node: String,
    downtime: Option<u64>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut network = ctx.load_network().await?;
    let downtime = downtime
        .map(Duration::from_secs)
        .unwrap_or_else(|| ctx.settings.failure_downtime());

    let injector = FailureInjector::new(
        ctx.docker()?,
        ctx.repository.clone(),
        ctx.feedback.clone(),
        NodeLockManager::new(),
        ctx.settings.recovery(),
    );
    injector
        .inject_temporary_failure(&mut network, &node, downtime, cancel)
        .await?;

    println!("✅ {} went through a {}s outage and is back online", node, downtime.as_secs());
    Ok(())
}
