//! Node entity and its status state machine

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::runtime::ContainerRef;

/// Run-time status of a node
///
/// Allowed transitions:
/// `Offline -> Starting`, `Starting -> Online | Syncing`,
/// `Online | Syncing -> Stopping`, `Stopping -> Offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Offline,
    Starting,
    Online,
    Syncing,
    Stopping,
}

impl NodeStatus {
    /// Check whether moving from `self` to `next` follows the state machine
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        use NodeStatus::*;
        matches!(
            (self, next),
            (Offline, Starting)
                | (Starting, Online)
                | (Starting, Syncing)
                | (Online, Stopping)
                | (Syncing, Stopping)
                | (Stopping, Offline)
        )
    }

    /// Online and syncing nodes both count towards liveness
    pub fn is_online(self) -> bool {
        matches!(self, NodeStatus::Online | NodeStatus::Syncing)
    }

    pub fn emoji(self) -> &'static str {
        match self {
            NodeStatus::Online => "✅",
            NodeStatus::Offline => "❌",
            NodeStatus::Syncing | NodeStatus::Starting => "🔄",
            NodeStatus::Stopping => "⏹️",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => write!(f, "Offline"),
            Self::Starting => write!(f, "Starting"),
            Self::Online => write!(f, "Online"),
            Self::Syncing => write!(f, "Syncing"),
            Self::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Execution client running inside a node container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Geth,
    Nethermind,
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geth => write!(f, "geth"),
            Self::Nethermind => write!(f, "nethermind"),
        }
    }
}

/// Point-in-time metrics observed for a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub latest_block: u64,
    pub peer_count: u64,
    pub pending_txs: u64,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    /// Native balance in wei, absent until first observed
    pub balance_wei: Option<U256>,
}

/// A member of the network with its live state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub is_validator: bool,
    pub client: ClientKind,
    pub address: Address,
    pub peer_port: u16,
    pub rpc_port: u16,
    pub ws_port: u16,
    /// Container handle, empty until the node has been launched
    pub container: Option<ContainerRef>,
    status: NodeStatus,
    pub metrics: NodeMetrics,
    pub last_seen: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        is_validator: bool,
        client: ClientKind,
        address: Address,
        peer_port: u16,
        rpc_port: u16,
        ws_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            is_validator,
            client,
            address,
            peer_port,
            rpc_port,
            ws_port,
            container: None,
            status: NodeStatus::Offline,
            metrics: NodeMetrics::default(),
            last_seen: None,
            started_at: None,
        }
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }

    /// Move to `next`, rejecting anything outside the state machine.
    /// The status is left unchanged on error.
    pub fn transition_to(&mut self, next: NodeStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                node: self.name.clone(),
                from: self.status,
                to: next,
            });
        }
        if next == NodeStatus::Starting {
            self.started_at = Some(Utc::now());
        }
        self.status = next;
        Ok(())
    }

    /// Promote a starting node once its endpoint answers.
    ///
    /// `Online` when it has peers, `Syncing` when it has seen a block, otherwise
    /// it stays `Starting`. Nodes not in `Starting` keep their status.
    pub fn confirm_readiness(&mut self, peer_count: u64, latest_block: u64) -> NodeStatus {
        self.metrics.peer_count = peer_count;
        self.metrics.latest_block = latest_block;
        self.last_seen = Some(Utc::now());

        if self.status == NodeStatus::Starting {
            let next = if peer_count > 0 {
                Some(NodeStatus::Online)
            } else if latest_block > 0 {
                Some(NodeStatus::Syncing)
            } else {
                None
            };
            if let Some(next) = next {
                self.status = next;
            }
        }
        self.status
    }

    /// Forget run-time state once the node's container has been removed.
    /// Only teardown uses this; it is the one way back to `Offline` from `Starting`.
    pub fn reset(&mut self) {
        self.container = None;
        self.status = NodeStatus::Offline;
        self.metrics = NodeMetrics::default();
        self.started_at = None;
    }

    pub fn rpc_endpoint(&self, host: &str) -> String {
        format!("http://{}:{}", host, self.rpc_port)
    }

    pub fn display_name(&self) -> String {
        if self.is_validator {
            format!("{} (validator)", self.name)
        } else {
            self.name.clone()
        }
    }
}
