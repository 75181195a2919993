//! Persistence capability for network and node state

use async_trait::async_trait;

use crate::error::CapabilityResult;
use crate::network::Network;
use crate::node::Node;

#[async_trait]
pub trait NetworkRepository: Send + Sync {
    /// Create or replace the stored network
    async fn save_network(&self, network: &Network) -> CapabilityResult<()>;

    /// Fails with `NotFound` when no network of that name is stored
    async fn get_network(&self, name: &str) -> CapabilityResult<Network>;

    async fn delete_network(&self, name: &str) -> CapabilityResult<()>;

    /// Replace a single node's stored state without rewriting the rest of the aggregate
    async fn update_node(&self, network_name: &str, node: &Node) -> CapabilityResult<()>;

    async fn get_node(&self, network_name: &str, node_name: &str) -> CapabilityResult<Node>;
}
