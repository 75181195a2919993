//! Network teardown: stop and remove every node container

use crate::error::Result;
use domain::{ContainerRuntime, Feedback, Network, NetworkRepository, NetworkStatus, NodeStatus};
use std::sync::Arc;
use tracing::{info, warn};

/// What a teardown managed to clean up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownSummary {
    pub removed: Vec<String>,
    /// Nodes whose container could not be removed; it may still exist
    pub failed: Vec<String>,
}

pub struct NetworkTeardown {
    runtime: Arc<dyn ContainerRuntime>,
    repository: Arc<dyn NetworkRepository>,
    feedback: Arc<dyn Feedback>,
    docker_network: String,
}

impl NetworkTeardown {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        repository: Arc<dyn NetworkRepository>,
        feedback: Arc<dyn Feedback>,
        docker_network: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            repository,
            feedback,
            docker_network: docker_network.into(),
        }
    }

    /// Stop and remove every node's container, then the runtime network.
    ///
    /// Individual failures are reported and skipped so one stuck container
    /// does not keep the others alive.
    pub async fn stop_network(&self, network: &mut Network) -> Result<TeardownSummary> {
        let mut summary = TeardownSummary::default();

        match network.status() {
            NetworkStatus::Stopped if network.nodes().iter().all(|n| n.container.is_none()) => {
                self.feedback
                    .info(&format!("Network {} is already stopped", network.name));
                return Ok(summary);
            }
            NetworkStatus::Stopped | NetworkStatus::Stopping => {}
            NetworkStatus::Starting | NetworkStatus::Running => {
                network.transition_to(NetworkStatus::Stopping)?;
            }
        }

        let mut progress = self
            .feedback
            .start_progress(&format!("Stopping {}", network.name), network.nodes().len() as u64);

        for (index, node) in network.nodes_mut().enumerate() {
            let Some(container) = node.container.clone() else {
                progress.update(index as u64 + 1, &format!("{} has no container", node.name));
                continue;
            };

            if node.is_online() {
                node.transition_to(NodeStatus::Stopping)?;
            }
            if let Err(e) = self.runtime.stop(&container).await {
                warn!("Failed to stop {}: {}", node.name, e);
            }
            match self.runtime.remove(&container).await {
                Ok(()) => {
                    if node.status() == NodeStatus::Stopping {
                        node.transition_to(NodeStatus::Offline)?;
                    }
                    node.reset();
                    summary.removed.push(node.name.clone());
                    progress.update(index as u64 + 1, &format!("🛑 {} removed", node.name));
                }
                Err(e) => {
                    warn!("Failed to remove container of {}: {}", node.name, e);
                    self.feedback
                        .warning(&format!("Could not remove container of {}: {}", node.name, e));
                    summary.failed.push(node.name.clone());
                }
            }
        }
        progress.complete(&format!("{} containers removed", summary.removed.len()));

        if let Err(e) = self.runtime.remove_network(&self.docker_network).await {
            warn!("Failed to remove runtime network {}: {}", self.docker_network, e);
        }

        if network.status() == NetworkStatus::Stopping {
            network.transition_to(NetworkStatus::Stopped)?;
        }
        network.refresh_metrics();
        if let Err(e) = self.repository.save_network(network).await {
            warn!("Failed to persist network {}: {}", network.name, e);
            self.feedback
                .warning(&format!("Could not save network {}: {}", network.name, e));
        }

        info!("Network {} stopped ({} containers removed)", network.name, summary.removed.len());
        Ok(summary)
    }
}
