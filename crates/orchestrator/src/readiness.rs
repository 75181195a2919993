//! Time-bounded readiness polling for single nodes and the whole network

use crate::config::PollBudget;
use crate::error::{OrchestratorError, Result};
use domain::{ChainRpc, Network, Node, NodeStatus};
use std::future::Future;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Paces attempts against a deadline.
///
/// The first attempt is immediate, the next ones follow every `interval`.
/// Cancellation wins over the deadline, the deadline wins over the next tick.
pub struct Poller {
    target: String,
    started: Instant,
    deadline: Instant,
    ticker: Interval,
    attempts: u32,
}

impl Poller {
    /// Fails with [`OrchestratorError::Configuration`] on a zero interval
    pub fn new(target: impl Into<String>, budget: PollBudget) -> Result<Self> {
        let target = target.into();
        if budget.interval.is_zero() {
            return Err(OrchestratorError::Configuration(format!(
                "poll interval for {} must be greater than zero",
                target
            )));
        }
        let started = Instant::now();
        let mut ticker = interval(budget.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ok(Self {
            target,
            started,
            deadline: started + budget.timeout,
            ticker,
            attempts: 0,
        })
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn timeout(&self) -> OrchestratorError {
        OrchestratorError::Timeout {
            target: self.target.clone(),
            elapsed: self.started.elapsed(),
        }
    }

    fn cancelled(&self) -> OrchestratorError {
        OrchestratorError::cancelled(format!("waiting for {}", self.target))
    }

    /// Wait for the next attempt slot
    pub async fn next_attempt(&mut self, cancel: &CancellationToken) -> Result<u32> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(self.cancelled()),
            _ = sleep_until(self.deadline) => Err(self.timeout()),
            _ = self.ticker.tick() => {
                self.attempts += 1;
                Ok(self.attempts)
            }
        }
    }

    /// Run one attempt, abandoning it on cancellation or at the deadline
    pub async fn guard<T>(
        &self,
        cancel: &CancellationToken,
        attempt: impl Future<Output = T>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(self.cancelled()),
            _ = sleep_until(self.deadline) => Err(self.timeout()),
            value = attempt => Ok(value),
        }
    }
}

/// Wait until the node's RPC endpoint answers
pub async fn await_node(
    rpc: &dyn ChainRpc,
    node_name: &str,
    endpoint: &str,
    budget: PollBudget,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut poller = Poller::new(format!("node {}", node_name), budget)?;
    loop {
        let attempt = poller.next_attempt(cancel).await?;
        match poller.guard(cancel, rpc.connect(endpoint)).await? {
            Ok(()) => {
                info!("✅ {} is reachable at {} (attempt {})", node_name, endpoint, attempt);
                return Ok(());
            }
            Err(e) => debug!("{} not ready yet (attempt {}): {}", node_name, attempt, e),
        }
    }
}

/// Promote a starting node from its observed peer count and block height.
///
/// Returns the node's status afterwards. Unreachable nodes are left as they are.
pub async fn refresh_node_status(
    rpc: &dyn ChainRpc,
    node: &mut Node,
    rpc_host: &str,
) -> NodeStatus {
    if node.status() != NodeStatus::Starting {
        return node.status();
    }

    let endpoint = node.rpc_endpoint(rpc_host);
    let latest_block = match rpc.latest_block_number(&endpoint).await {
        Ok(block) => block,
        Err(e) => {
            debug!("{}: block height unavailable: {}", node.name, e);
            return node.status();
        }
    };
    let peer_count = match rpc.peer_count(&endpoint).await {
        Ok(peers) => peers,
        Err(e) => {
            debug!("{}: peer count unavailable: {}", node.name, e);
            0
        }
    };

    let status = node.confirm_readiness(peer_count, latest_block);
    if status != NodeStatus::Starting {
        info!(
            "{} {} is {} (block {}, {} peers)",
            status.emoji(),
            node.name,
            status,
            latest_block,
            peer_count
        );
    }
    status
}

/// Wait until the validator quorum is live.
///
/// Each attempt refreshes the status of nodes still starting, then evaluates
/// [`Network::is_healthy`]. Non-validators may still be starting on success.
pub async fn await_network(
    rpc: &dyn ChainRpc,
    network: &mut Network,
    rpc_host: &str,
    budget: PollBudget,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut poller = Poller::new(format!("network {} quorum", network.name), budget)?;
    loop {
        let attempt = poller.next_attempt(cancel).await?;
        poller
            .guard(cancel, async {
                for node in network.nodes_mut() {
                    refresh_node_status(rpc, node, rpc_host).await;
                }
            })
            .await?;
        network.refresh_metrics();

        if network.is_healthy() {
            info!(
                "✅ Network {} is healthy: {} validators online (attempt {})",
                network.name,
                network.online_validator_count(),
                attempt
            );
            return Ok(());
        }
        debug!(
            "Network {} not healthy yet: {} validators online (attempt {})",
            network.name,
            network.online_validator_count(),
            attempt
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_poller_attempt_schedule() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let mut poller = Poller::new("alice", PollBudget::from_secs(10, 2)).unwrap();

        let mut times = Vec::new();
        let err = loop {
            match poller.next_attempt(&cancel).await {
                Ok(_) => times.push(start.elapsed().as_secs()),
                Err(e) => break e,
            }
        };

        assert_eq!(times, vec![0, 2, 4, 6, 8]);
        assert_eq!(poller.attempts(), 5);
        assert!(err.is_timeout());
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_observes_cancellation_first() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut poller = Poller::new("alice", PollBudget::from_secs(10, 2)).unwrap();
        let err = poller.next_attempt(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(poller.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_abandons_attempt_at_deadline() {
        let cancel = CancellationToken::new();
        let poller = Poller::new("slow", PollBudget::from_secs(3, 1)).unwrap();
        let err = poller
            .guard(&cancel, tokio::time::sleep(Duration::from_secs(30)))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_zero_interval_is_a_configuration_error() {
        let err = Poller::new("alice", PollBudget::from_secs(10, 0)).err().unwrap();
        assert!(matches!(err, OrchestratorError::Configuration(_)));
    }
}
