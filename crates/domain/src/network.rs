//! Network aggregate: membership, status and quorum health

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::node::Node;

/// Minimum number of live validators for the network to be considered healthy.
///
/// Fixed for a three-signer Clique set; it does not scale with roster size.
pub const HEALTH_QUORUM: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl NetworkStatus {
    /// `Stopped -> Starting -> Running -> Stopping -> Stopped`, plus
    /// `Starting -> Stopping` to tear down a launch that never reached quorum.
    pub fn can_transition_to(self, next: NetworkStatus) -> bool {
        use NetworkStatus::*;
        matches!(
            (self, next),
            (Stopped, Starting)
                | (Starting, Running)
                | (Starting, Stopping)
                | (Running, Stopping)
                | (Stopping, Stopped)
        )
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "Stopped"),
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Aggregate metrics, recomputed from the member nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub total_nodes: usize,
    pub online_nodes: usize,
    pub latest_block: u64,
    pub total_txs: u64,
}

/// A private chain deployment and its ordered node roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub chain_id: u64,
    /// Consensus family, e.g. "clique"
    pub consensus: String,
    pub block_period_secs: u64,
    pub epoch_length: u64,
    status: NetworkStatus,
    nodes: Vec<Node>,
    pub metrics: NetworkMetrics,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

impl Network {
    pub fn new(
        name: impl Into<String>,
        chain_id: u64,
        consensus: impl Into<String>,
        block_period_secs: u64,
        epoch_length: u64,
    ) -> Self {
        Self {
            name: name.into(),
            chain_id,
            consensus: consensus.into(),
            block_period_secs,
            epoch_length,
            status: NetworkStatus::Stopped,
            nodes: Vec::new(),
            metrics: NetworkMetrics::default(),
            created_at: Utc::now(),
            started_at: None,
        }
    }

    pub fn status(&self) -> NetworkStatus {
        self.status
    }

    pub fn transition_to(&mut self, next: NetworkStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidNetworkTransition {
                network: self.name.clone(),
                from: self.status,
                to: next,
            });
        }
        if next == NetworkStatus::Running {
            self.started_at = Some(Utc::now());
        }
        self.status = next;
        Ok(())
    }

    /// Append a node, keeping roster order. Names must be unique.
    pub fn add_node(&mut self, node: Node) -> Result<(), DomainError> {
        if self.node(&node.name).is_some() {
            return Err(DomainError::DuplicateNode(node.name));
        }
        self.nodes.push(node);
        self.metrics.total_nodes = self.nodes.len();
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    /// Validators in roster order (a view over `nodes`)
    pub fn validators(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_validator)
    }

    pub fn online_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_online()).count()
    }

    pub fn online_validator_count(&self) -> usize {
        self.validators().filter(|n| n.is_online()).count()
    }

    /// Running and at least [`HEALTH_QUORUM`] validators online or syncing
    pub fn is_healthy(&self) -> bool {
        self.status == NetworkStatus::Running && self.online_validator_count() >= HEALTH_QUORUM
    }

    pub fn refresh_metrics(&mut self) {
        self.metrics.total_nodes = self.nodes.len();
        self.metrics.online_nodes = self.online_count();
        self.metrics.latest_block = self
            .nodes
            .iter()
            .map(|n| n.metrics.latest_block)
            .max()
            .unwrap_or(0);
        self.metrics.total_txs = self.nodes.iter().map(|n| n.metrics.pending_txs).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ClientKind, NodeStatus};
    use alloy::primitives::Address;

    fn network_with_validators(online: usize) -> Network {
        let mut network = Network::new("devnet-network", 1337, "clique", 5, 30000);
        for (i, name) in ["alice", "bob", "cassandra"].iter().enumerate() {
            let mut node = Node::new(
                *name,
                true,
                ClientKind::Geth,
                Address::ZERO,
                30303 + i as u16,
                8545 + i as u16,
                9545 + i as u16,
            );
            if i < online {
                node.transition_to(NodeStatus::Starting).unwrap();
                node.confirm_readiness(1, 1);
            }
            network.add_node(node).unwrap();
        }
        network
            .add_node(Node::new("driss", false, ClientKind::Geth, Address::ZERO, 30306, 8548, 9548))
            .unwrap();
        network
    }

    fn running(mut network: Network) -> Network {
        network.transition_to(NetworkStatus::Starting).unwrap();
        network.transition_to(NetworkStatus::Running).unwrap();
        network
    }

    #[test]
    fn test_health_quorum_against_three_validators() {
        for (online, healthy) in [(0, false), (1, false), (2, true), (3, true)] {
            let network = running(network_with_validators(online));
            assert_eq!(network.is_healthy(), healthy, "{} validators online", online);
        }
    }

    #[test]
    fn test_not_healthy_unless_running() {
        let network = network_with_validators(3);
        assert_eq!(network.status(), NetworkStatus::Stopped);
        assert!(!network.is_healthy());
    }

    #[test]
    fn test_syncing_validators_count_towards_quorum() {
        let mut network = running(network_with_validators(1));
        let bob = network.node_mut("bob").unwrap();
        bob.transition_to(NodeStatus::Starting).unwrap();
        assert_eq!(bob.confirm_readiness(0, 4), NodeStatus::Syncing);
        assert!(network.is_healthy());
    }

    #[test]
    fn test_non_validators_do_not_count() {
        let mut network = running(network_with_validators(1));
        let driss = network.node_mut("driss").unwrap();
        driss.transition_to(NodeStatus::Starting).unwrap();
        driss.confirm_readiness(3, 3);
        assert_eq!(network.online_count(), 2);
        assert!(!network.is_healthy());
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut network = network_with_validators(0);
        let err = network
            .add_node(Node::new("alice", false, ClientKind::Geth, Address::ZERO, 1, 2, 3))
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateNode("alice".to_string()));
        assert_eq!(network.nodes().len(), 4);
    }

    #[test]
    fn test_validators_view_preserves_roster_order() {
        let network = network_with_validators(0);
        let names: Vec<_> = network.validators().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "cassandra"]);
    }

    #[test]
    fn test_network_transitions() {
        let mut network = network_with_validators(0);
        assert!(network.transition_to(NetworkStatus::Running).is_err());
        network.transition_to(NetworkStatus::Starting).unwrap();
        network.transition_to(NetworkStatus::Running).unwrap();
        assert!(network.started_at.is_some());
        network.transition_to(NetworkStatus::Stopping).unwrap();
        network.transition_to(NetworkStatus::Stopped).unwrap();
    }

    #[test]
    fn test_refresh_metrics() {
        let mut network = running(network_with_validators(2));
        network.node_mut("alice").unwrap().metrics.latest_block = 42;
        network.node_mut("bob").unwrap().metrics.pending_txs = 3;
        network.refresh_metrics();
        assert_eq!(network.metrics.total_nodes, 4);
        assert_eq!(network.metrics.online_nodes, 2);
        assert_eq!(network.metrics.latest_block, 42);
        assert_eq!(network.metrics.total_txs, 3);
    }

    #[test]
    fn test_round_trips_through_json() {
        let network = running(network_with_validators(2));
        let json = serde_json::to_string(&network).unwrap();
        let restored: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.status(), NetworkStatus::Running);
        assert_eq!(restored.nodes().len(), 4);
        assert!(restored.is_healthy());
    }
}
