//! Network provisioning and launch sequencing

use crate::client::container_spec;
use crate::config::Settings;
use crate::constants::CONSENSUS_FAMILY;
use crate::error::{OrchestratorError, Result};
use crate::genesis::{self, GenesisBuilder};
use crate::readiness::{await_network, await_node, refresh_node_status};
use crate::roster::{self, NodeConfig};
use domain::{
    ChainRpc, ContainerRuntime, Feedback, Network, NetworkRepository, NetworkStatus, NodeStatus,
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of a launch that reached quorum
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSummary {
    /// Nodes whose container was started, in roster order
    pub started: Vec<String>,
    /// Nodes whose RPC endpoint did not answer within the node budget
    pub unreachable: Vec<String>,
}

pub struct LaunchOrchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    rpc: Arc<dyn ChainRpc>,
    repository: Arc<dyn NetworkRepository>,
    feedback: Arc<dyn Feedback>,
    settings: Settings,
}

impl LaunchOrchestrator {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        rpc: Arc<dyn ChainRpc>,
        repository: Arc<dyn NetworkRepository>,
        feedback: Arc<dyn Feedback>,
        settings: Settings,
    ) -> Self {
        Self {
            runtime,
            rpc,
            repository,
            feedback,
            settings,
        }
    }

    pub fn prepare(&self) -> Result<(Network, Vec<NodeConfig>)> {
        prepare(&self.settings)
    }

    /// Create and start every node container in roster order, then wait for
    /// the validator quorum.
    ///
    /// The first node that fails to be created or started aborts the rest of
    /// the sequence with [`OrchestratorError::LaunchAborted`]. Nodes already
    /// started keep running.
    pub async fn launch(
        &self,
        network: &mut Network,
        configs: &[NodeConfig],
        cancel: &CancellationToken,
    ) -> Result<LaunchSummary> {
        roster::check_unique(configs)?;
        for config in configs {
            if network.node(&config.name).is_none() {
                return Err(OrchestratorError::Configuration(format!(
                    "node {} is not part of network {}",
                    config.name, network.name
                )));
            }
        }
        let genesis_path = absolute(&self.settings.genesis_path())?;
        if !genesis_path.exists() {
            return Err(OrchestratorError::Configuration(format!(
                "genesis file {} is missing",
                genesis_path.display()
            )));
        }

        self.feedback.info(&format!("🚀 Launching network {}", network.name));
        self.feedback.info(&format!(
            "   {} nodes, {} validators, consensus {}",
            configs.len(),
            configs.iter().filter(|c| c.is_validator).count(),
            network.consensus
        ));

        self.runtime.ping().await.map_err(|e| {
            self.feedback.error(&format!(
                "Container runtime {} is unreachable",
                self.runtime.provider()
            ));
            OrchestratorError::Capability(e)
        })?;

        network.transition_to(NetworkStatus::Starting)?;
        self.runtime.create_network(&self.settings.docker_network).await?;

        let mut progress = self.feedback.start_progress("Launching nodes", configs.len() as u64);
        let mut summary = LaunchSummary::default();

        for (index, config) in configs.iter().enumerate() {
            if let Err(source) = self.start_node(network, config, &genesis_path, cancel).await {
                error!("Failed to launch {}: {}", config.name, source);
                progress.error(&format!("Failed to launch {}: {}", config.name, source));
                self.persist(network).await;
                return Err(OrchestratorError::LaunchAborted {
                    node: config.name.clone(),
                    started: summary.started,
                    source: Box::new(source),
                });
            }
            summary.started.push(config.name.clone());
            progress.update(index as u64 + 1, &format!("✅ {} started", config.name));
        }
        progress.complete(&format!("{} nodes started", summary.started.len()));

        network.transition_to(NetworkStatus::Running)?;
        self.persist(network).await;

        summary.unreachable = self.await_nodes(network, cancel).await?;

        let mut spinner = self.feedback.start_spinner("Waiting for validator quorum...");
        let rpc_host = self.settings.rpc_host.clone();
        let result = await_network(
            self.rpc.as_ref(),
            network,
            &rpc_host,
            self.settings.network_readiness(),
            cancel,
        )
        .await;
        self.persist(network).await;

        match result {
            Ok(()) => {
                spinner.success(&format!(
                    "Quorum reached: {}/{} validators online",
                    network.online_validator_count(),
                    network.validators().count()
                ));
                self.feedback.success(&format!("Network {} launched", network.name));
                Ok(summary)
            }
            Err(e) => {
                spinner.error(&format!("Network {} did not reach quorum: {}", network.name, e));
                Err(e)
            }
        }
    }

    async fn start_node(
        &self,
        network: &mut Network,
        config: &NodeConfig,
        genesis_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(OrchestratorError::cancelled(format!("launching {}", config.name)));
        }

        let mut config = config.clone();
        config.data_dir = absolute(&config.data_dir)?;
        config.keystore_dir = absolute(&config.keystore_dir)?;
        let spec = container_spec(&config, &self.settings, genesis_path);

        let node = network
            .node_mut(&config.name)
            .ok_or_else(|| OrchestratorError::not_found("node", &config.name))?;
        node.transition_to(NodeStatus::Starting)?;

        let container = self
            .runtime
            .create_container(&config.name, &spec)
            .await
            .map_err(|e| OrchestratorError::node_operation(&config.name, "create container", e))?;
        debug!("Created container {} for {}", container.short(), config.name);
        node.container = Some(container.clone());

        self.runtime
            .start(&container)
            .await
            .map_err(|e| OrchestratorError::node_operation(&config.name, "start container", e))?;

        info!(
            "🔄 Started {} ({}) in container {}",
            config.name,
            config.client,
            container.short()
        );
        Ok(())
    }

    /// Poll every starting node concurrently. Returns the nodes that stayed
    /// unreachable; those are warnings, quorum decides the launch.
    async fn await_nodes(
        &self,
        network: &mut Network,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let budget = self.settings.node_readiness();
        let targets: Vec<(String, String)> = network
            .nodes()
            .iter()
            .filter(|n| n.status() == NodeStatus::Starting)
            .map(|n| (n.name.clone(), n.rpc_endpoint(&self.settings.rpc_host)))
            .collect();

        let results = join_all(targets.iter().map(|(name, endpoint)| async move {
            (name, await_node(self.rpc.as_ref(), name, endpoint, budget, cancel).await)
        }))
        .await;

        let mut unreachable = Vec::new();
        for (name, result) in results {
            match result {
                Ok(()) => {
                    if let Some(node) = network.node_mut(name) {
                        refresh_node_status(self.rpc.as_ref(), node, &self.settings.rpc_host).await;
                        let node = node.clone();
                        self.persist_node(&network.name, &node).await;
                    }
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!("{} did not become reachable: {}", name, e);
                    self.feedback
                        .warning(&format!("{} is not reachable yet, it stays Starting", name));
                    unreachable.push(name.clone());
                }
            }
        }
        Ok(unreachable)
    }

    async fn persist(&self, network: &mut Network) {
        network.refresh_metrics();
        if let Err(e) = self.repository.save_network(network).await {
            warn!("Failed to persist network {}: {}", network.name, e);
            self.feedback
                .warning(&format!("Could not save network {}: {}", network.name, e));
        }
    }

    async fn persist_node(&self, network_name: &str, node: &domain::Node) {
        if let Err(e) = self.repository.update_node(network_name, node).await {
            warn!("Failed to persist node {}: {}", node.name, e);
        }
    }
}

/// Generate identities, write keystores and the genesis document, and
/// build the network record. No container is touched.
pub fn prepare(settings: &Settings) -> Result<(Network, Vec<NodeConfig>)> {
    let configs = roster::generate_default_set(&settings.nodes_dir())?;
    roster::save_all(&configs)?;

    let mut builder = GenesisBuilder::new(
        settings.chain_id,
        settings.block_period_secs,
        settings.epoch_length,
    );
    roster::genesis_from_roster(&configs, &mut builder);
    let spec = builder.build()?;
    genesis::save(&spec, &settings.genesis_path())?;
    info!(
        "📜 Genesis for chain {} written to {}",
        settings.chain_id,
        settings.genesis_path().display()
    );

    let network = network_from_roster(settings, &configs)?;
    Ok((network, configs))
}

/// Network record with one `Offline` node per roster member
pub fn network_from_roster(settings: &Settings, configs: &[NodeConfig]) -> Result<Network> {
    let mut network = Network::new(
        settings.network_name.clone(),
        settings.chain_id,
        CONSENSUS_FAMILY,
        settings.block_period_secs,
        settings.epoch_length,
    );
    for config in configs {
        network.add_node(config.to_node())?;
    }
    Ok(network)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| OrchestratorError::io(path, e))
}
