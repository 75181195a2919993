//! Network status reporting, one-shot or on an interval

use crate::error::Result;
use domain::{
    ChainRpc, ContainerRuntime, ContainerStats, Feedback, Network, NetworkRepository, Node,
    NodeStatus, U256,
};
use ethereum::{ETHER_DECIMALS, wei_to_ether};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const TABLE_HEADERS: [&str; 7] = [
    "Node",
    "Status",
    "Latest Block",
    "Peers",
    "CPU/Memory",
    "ETH Balance",
    "Mempool",
];

const UNAVAILABLE: &str = "N/A";

/// What one pass observed for a node. `None` means the query failed or the
/// backend does not support it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSnapshot {
    pub name: String,
    pub display_name: String,
    pub status: NodeStatus,
    pub reachable: bool,
    pub latest_block: Option<u64>,
    pub peers: Option<u64>,
    pub stats: Option<ContainerStats>,
    pub balance: Option<U256>,
    pub pending_txs: Option<u64>,
}

impl NodeSnapshot {
    pub fn row(&self) -> Vec<String> {
        vec![
            self.display_name.clone(),
            format!("{} {}", self.status.emoji(), self.status),
            or_unavailable(self.latest_block),
            or_unavailable(self.peers),
            self.stats
                .as_ref()
                .map(format_usage)
                .unwrap_or_else(|| UNAVAILABLE.to_string()),
            self.balance
                .map(|wei| format!("{:.4}", wei_to_ether(wei, ETHER_DECIMALS)))
                .unwrap_or_else(|| UNAVAILABLE.to_string()),
            or_unavailable(self.pending_txs),
        ]
    }
}

fn or_unavailable(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| UNAVAILABLE.to_string())
}

fn format_usage(stats: &ContainerStats) -> String {
    format!(
        "{:.1}% / {:.1} MB",
        stats.cpu_percent,
        stats.memory_bytes as f64 / (1024.0 * 1024.0)
    )
}

pub struct NetworkMonitor {
    runtime: Arc<dyn ContainerRuntime>,
    rpc: Arc<dyn ChainRpc>,
    repository: Arc<dyn NetworkRepository>,
    feedback: Arc<dyn Feedback>,
    rpc_host: String,
}

impl NetworkMonitor {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        rpc: Arc<dyn ChainRpc>,
        repository: Arc<dyn NetworkRepository>,
        feedback: Arc<dyn Feedback>,
        rpc_host: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            rpc,
            repository,
            feedback,
            rpc_host: rpc_host.into(),
        }
    }

    /// Query one node. Metrics that could be read are written back to the node.
    pub async fn observe(&self, node: &mut Node) -> NodeSnapshot {
        let endpoint = node.rpc_endpoint(&self.rpc_host);
        let mut snapshot = NodeSnapshot {
            name: node.name.clone(),
            display_name: node.display_name(),
            status: node.status(),
            ..Default::default()
        };

        if let Some(container) = &node.container {
            match self.runtime.stats(container).await {
                Ok(stats) => {
                    node.metrics.cpu_percent = stats.cpu_percent;
                    node.metrics.memory_bytes = stats.memory_bytes;
                    snapshot.stats = Some(stats);
                }
                Err(e) => debug!("{}: container stats unavailable: {}", node.name, e),
            }
        }

        match self.rpc.latest_block_number(&endpoint).await {
            Ok(block) => {
                snapshot.reachable = true;
                snapshot.latest_block = Some(block);
                node.metrics.latest_block = block;
                node.last_seen = Some(chrono::Utc::now());
            }
            Err(e) => {
                debug!("{}: unreachable at {}: {}", node.name, endpoint, e);
                return snapshot;
            }
        }

        if let Ok(peers) = self.rpc.peer_count(&endpoint).await {
            node.metrics.peer_count = peers;
            snapshot.peers = Some(peers);
        }
        if let Ok(balance) = self.rpc.balance(&endpoint, node.address).await {
            node.metrics.balance_wei = Some(balance);
            snapshot.balance = Some(balance);
        }
        if let Ok(pending) = self.rpc.pending_tx_count(&endpoint).await {
            node.metrics.pending_txs = pending;
            snapshot.pending_txs = Some(pending);
        }

        // A reachable node still marked Starting has finished booting
        if node.status() == NodeStatus::Starting {
            snapshot.status =
                node.confirm_readiness(node.metrics.peer_count, node.metrics.latest_block);
        }
        snapshot
    }

    /// Query every node, persist what was learned and return one snapshot per node
    pub async fn collect(&self, network: &mut Network) -> Vec<NodeSnapshot> {
        let mut snapshots = Vec::with_capacity(network.nodes().len());
        let network_name = network.name.clone();

        for node in network.nodes_mut() {
            let snapshot = self.observe(node).await;
            if let Err(e) = self.repository.update_node(&network_name, node).await {
                warn!("Failed to persist metrics of {}: {}", node.name, e);
                self.feedback
                    .warning(&format!("Could not save metrics of {}: {}", node.name, e));
            }
            snapshots.push(snapshot);
        }
        network.refresh_metrics();
        snapshots
    }

    /// Render one status table followed by the quorum verdict
    pub async fn report(&self, network: &mut Network) -> Vec<NodeSnapshot> {
        let snapshots = self.collect(network).await;
        let rows: Vec<Vec<String>> = snapshots.iter().map(NodeSnapshot::row).collect();

        self.feedback.info(&format!(
            "📊 Network {} ({}), chain id {}",
            network.name,
            network.status(),
            network.chain_id
        ));
        self.feedback.display_table(&TABLE_HEADERS, &rows);

        let validators = network.validators().count();
        let online = network.online_validator_count();
        if network.is_healthy() {
            self.feedback.success(&format!(
                "Network health: healthy ({}/{} validators online)",
                online, validators
            ));
        } else {
            self.feedback.warning(&format!(
                "Network health: degraded ({}/{} validators online)",
                online, validators
            ));
        }
        snapshots
    }

    /// Reload the network record and report it
    pub async fn report_stored(&self, network_name: &str) -> Result<Vec<NodeSnapshot>> {
        let mut network = self.repository.get_network(network_name).await?;
        Ok(self.report(&mut network).await)
    }

    /// Report every `every` until cancelled. Failed iterations are logged and skipped.
    pub async fn run_continuous(
        &self,
        network_name: &str,
        every: Duration,
        cancel: &CancellationToken,
    ) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Monitoring {} every {:?}", network_name, every);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Monitoring of {} stopped", network_name);
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.report_stored(network_name).await {
                        warn!("Monitoring iteration failed: {}", e);
                        self.feedback.warning(&format!("Refresh failed: {}", e));
                    }
                }
            }
        }
    }
}
