//! Temporary node failure: stop a running node, hold it down, bring it back

use crate::config::PollBudget;
use crate::error::{OrchestratorError, Result};
use crate::node_lock::NodeLockManager;
use crate::readiness::Poller;
use domain::{ContainerRuntime, Feedback, Network, NetworkRepository, Node, NodeStatus};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DOWNTIME_TICK: Duration = Duration::from_secs(1);

pub struct FailureInjector {
    runtime: Arc<dyn ContainerRuntime>,
    repository: Arc<dyn NetworkRepository>,
    feedback: Arc<dyn Feedback>,
    locks: NodeLockManager,
    recovery: PollBudget,
}

impl FailureInjector {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        repository: Arc<dyn NetworkRepository>,
        feedback: Arc<dyn Feedback>,
        locks: NodeLockManager,
        recovery: PollBudget,
    ) -> Self {
        Self {
            runtime,
            repository,
            feedback,
            locks,
            recovery,
        }
    }

    /// Stop `node_name`, keep it down for `downtime`, restart it and wait for
    /// its container to report running again.
    ///
    /// Preconditions are checked before anything is stopped: the node must
    /// exist, be free of other operations and have a running container.
    pub async fn inject_temporary_failure(
        &self,
        network: &mut Network,
        node_name: &str,
        downtime: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let node = network
            .node(node_name)
            .ok_or_else(|| OrchestratorError::not_found("node", node_name))?;

        let _guard = self.locks.try_lock(node_name).ok_or_else(|| {
            OrchestratorError::precondition(node_name, "another operation holds this node")
        })?;

        let container = node
            .container
            .clone()
            .ok_or_else(|| OrchestratorError::precondition(node_name, "no container assigned"))?;
        let running = self
            .runtime
            .is_running(&container)
            .await
            .map_err(|e| OrchestratorError::node_operation(node_name, "inspect container", e))?;
        if !running {
            return Err(OrchestratorError::precondition(
                node_name,
                "container is not running",
            ));
        }

        self.feedback.info(&format!(
            "💥 Simulating failure of {} for {}s",
            node_name,
            downtime.as_secs()
        ));

        race(cancel, format!("stopping {}", node_name), self.runtime.stop(&container))
            .await?
            .map_err(|e| OrchestratorError::node_operation(node_name, "stop container", e))?;
        let node = node_entry(network, node_name)?;
        if node.status().can_transition_to(NodeStatus::Stopping) {
            node.transition_to(NodeStatus::Stopping)?;
            node.transition_to(NodeStatus::Offline)?;
        } else {
            warn!("{} stopped while {}, status left unchanged", node_name, node.status());
            self.feedback.warning(&format!(
                "{} was {} when stopped, its status is left unchanged",
                node_name,
                node.status()
            ));
        }
        let snapshot = node.clone();
        self.persist(&network.name, &snapshot).await;
        info!("🛑 {} stopped", node_name);

        self.hold_down(node_name, downtime, cancel).await?;

        race(cancel, format!("restarting {}", node_name), self.runtime.start(&container))
            .await?
            .map_err(|source| OrchestratorError::RestartFailure {
                node: node_name.to_string(),
                source,
            })?;
        let node = node_entry(network, node_name)?;
        if node.status() == NodeStatus::Offline {
            node.transition_to(NodeStatus::Starting)?;
        }
        info!("🔄 {} restarted, waiting for recovery", node_name);

        let mut spinner = self
            .feedback
            .start_spinner(&format!("Waiting for {} to recover...", node_name));
        if let Err(e) = self.await_recovery(node_name, &container, cancel).await {
            spinner.error(&format!("{} did not recover: {}", node_name, e));
            return Err(e);
        }

        let node = node_entry(network, node_name)?;
        node.transition_to(NodeStatus::Online)?;
        node.last_seen = Some(chrono::Utc::now());
        let snapshot = node.clone();
        network.refresh_metrics();
        self.persist(&network.name, &snapshot).await;

        spinner.success(&format!("{} recovered", node_name));
        Ok(())
    }

    /// Sleep through the downtime one second at a time, reporting each second
    async fn hold_down(
        &self,
        node_name: &str,
        downtime: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let total = downtime.as_secs();
        let mut progress = self
            .feedback
            .start_progress(&format!("{} downtime", node_name), total);

        for elapsed in 1..=total {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    progress.error("Interrupted");
                    return Err(OrchestratorError::cancelled(format!("downtime of {}", node_name)));
                }
                _ = tokio::time::sleep(DOWNTIME_TICK) => {
                    progress.update(elapsed, &format!("{}s remaining", total - elapsed));
                }
            }
        }
        progress.complete(&format!("{} downtime over", node_name));
        Ok(())
    }

    async fn await_recovery(
        &self,
        node_name: &str,
        container: &domain::ContainerRef,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let recovery_timeout = |err: OrchestratorError| match err {
            OrchestratorError::Timeout { elapsed, .. } => OrchestratorError::RecoveryTimeout {
                node: node_name.to_string(),
                elapsed,
            },
            other => other,
        };

        let mut poller = Poller::new(format!("node {} recovery", node_name), self.recovery)?;
        loop {
            let attempt = poller.next_attempt(cancel).await.map_err(recovery_timeout)?;
            let outcome = poller
                .guard(cancel, self.runtime.is_running(container))
                .await
                .map_err(recovery_timeout)?;
            match outcome {
                Ok(true) => {
                    info!("✅ {} is running again (attempt {})", node_name, attempt);
                    return Ok(());
                }
                Ok(false) => debug!("{} not running yet (attempt {})", node_name, attempt),
                Err(e) => debug!("{} inspection failed (attempt {}): {}", node_name, attempt, e),
            }
        }
    }

    async fn persist(&self, network_name: &str, node: &Node) {
        if let Err(e) = self.repository.update_node(network_name, node).await {
            warn!("Failed to persist {}: {}", node.name, e);
            self.feedback
                .warning(&format!("Could not save status of {}: {}", node.name, e));
        }
    }
}

fn node_entry<'a>(network: &'a mut Network, node_name: &str) -> Result<&'a mut Node> {
    network
        .node_mut(node_name)
        .ok_or_else(|| OrchestratorError::not_found("node", node_name))
}

/// Run a runtime call unless cancellation comes first
async fn race<T>(
    cancel: &CancellationToken,
    operation: String,
    call: impl Future<Output = T>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OrchestratorError::cancelled(operation)),
        value = call => Ok(value),
    }
}
