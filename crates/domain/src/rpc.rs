//! Chain RPC capability

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::{CapabilityError, CapabilityResult};

/// Queries the orchestrator issues against a node's JSON-RPC endpoint
#[async_trait]
pub trait ChainRpc: Send + Sync {
    fn provider(&self) -> &str;

    /// Establish (or re-check) a connection; success means the endpoint answers
    async fn connect(&self, endpoint: &str) -> CapabilityResult<()>;

    async fn latest_block_number(&self, endpoint: &str) -> CapabilityResult<u64>;

    async fn peer_count(&self, endpoint: &str) -> CapabilityResult<u64>;

    async fn pending_tx_count(&self, endpoint: &str) -> CapabilityResult<u64> {
        let _ = endpoint;
        Err(CapabilityError::not_supported("pending_tx_count", self.provider()))
    }

    /// Balance in wei
    async fn balance(&self, endpoint: &str, address: Address) -> CapabilityResult<U256>;
}
