use alloy::primitives::{Address, U64, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::TransportError;
use async_trait::async_trait;
use domain::{CapabilityError, CapabilityResult, ChainRpc};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TxPoolStatus {
    pending: U64,
}

/// Chain RPC capability over HTTP JSON-RPC.
///
/// Providers are cached per endpoint in a store owned by the client.
pub struct AlloyRpcClient {
    providers: RwLock<HashMap<String, DynProvider>>,
    request_timeout: Duration,
}

impl Default for AlloyRpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AlloyRpcClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(request_timeout: Duration) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            request_timeout,
        }
    }

    async fn provider(&self, endpoint: &str) -> CapabilityResult<DynProvider> {
        if let Some(provider) = self.providers.read().await.get(endpoint) {
            return Ok(provider.clone());
        }

        let url = endpoint.parse().map_err(|e| {
            CapabilityError::connection(format!("invalid endpoint {}: {}", endpoint, e))
        })?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url)
            .erased();

        debug!("Created RPC provider for {}", endpoint);
        self.providers
            .write()
            .await
            .insert(endpoint.to_string(), provider.clone());
        Ok(provider)
    }

    /// Drop the cached provider so the next call reconnects
    pub async fn disconnect(&self, endpoint: &str) {
        self.providers.write().await.remove(endpoint);
    }

    async fn call<T, F>(&self, endpoint: &str, method: &str, request: F) -> CapabilityResult<T>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_transport_error(endpoint, method, e)),
            Err(_) => Err(CapabilityError::connection(format!(
                "{} on {} timed out after {:?}",
                method, endpoint, self.request_timeout
            ))),
        }
    }
}

fn map_transport_error(endpoint: &str, method: &str, err: TransportError) -> CapabilityError {
    if let Some(payload) = err.as_error_resp() {
        if payload.code == METHOD_NOT_FOUND {
            return CapabilityError::not_supported(method, endpoint);
        }
        return CapabilityError::operation(format!(
            "{} on {}: {}",
            method, endpoint, payload.message
        ));
    }
    CapabilityError::connection(format!("{} on {}: {}", method, endpoint, err))
}

#[async_trait]
impl ChainRpc for AlloyRpcClient {
    fn provider(&self) -> &str {
        "json-rpc"
    }

    async fn connect(&self, endpoint: &str) -> CapabilityResult<()> {
        let provider = self.provider(endpoint).await?;
        let result = self.call(endpoint, "eth_chainId", provider.get_chain_id()).await;
        if result.is_err() {
            self.disconnect(endpoint).await;
        }
        result.map(|_| ())
    }

    async fn latest_block_number(&self, endpoint: &str) -> CapabilityResult<u64> {
        let provider = self.provider(endpoint).await?;
        self.call(endpoint, "eth_blockNumber", provider.get_block_number()).await
    }

    async fn peer_count(&self, endpoint: &str) -> CapabilityResult<u64> {
        let provider = self.provider(endpoint).await?;
        let count: U64 = self
            .call(endpoint, "net_peerCount", provider.raw_request("net_peerCount".into(), ()))
            .await?;
        Ok(count.to::<u64>())
    }

    async fn pending_tx_count(&self, endpoint: &str) -> CapabilityResult<u64> {
        let provider = self.provider(endpoint).await?;
        let status: TxPoolStatus = self
            .call(endpoint, "txpool_status", provider.raw_request("txpool_status".into(), ()))
            .await?;
        Ok(status.pending.to::<u64>())
    }

    async fn balance(&self, endpoint: &str, address: Address) -> CapabilityResult<U256> {
        let provider = self.provider(endpoint).await?;
        self.call(endpoint, "eth_getBalance", async { provider.get_balance(address).await })
            .await
    }
}
