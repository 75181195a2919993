use anyhow::{Context, Result};
use docker::DockerManager;
use domain::{CapabilityError, Network, NetworkRepository};
use ethereum::AlloyRpcClient;
use monitoring::{ConsoleFeedback, LogDestination};
use orchestrator::{JsonFileRepository, OrchestratorError, Settings};
use std::sync::Arc;

/// Backends shared by every command
pub struct AppContext {
    pub settings: Settings,
    pub feedback: Arc<ConsoleFeedback>,
    pub repository: Arc<JsonFileRepository>,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        let repository = Arc::new(JsonFileRepository::new(settings.networks_dir()));
        Self {
            settings,
            feedback: Arc::new(ConsoleFeedback::new(LogDestination::from_env())),
            repository,
        }
    }

    pub fn docker(&self) -> Result<Arc<DockerManager>> {
        let manager = DockerManager::new().context("Failed to connect to the Docker daemon")?;
        Ok(Arc::new(manager))
    }

    pub fn rpc(&self) -> Arc<AlloyRpcClient> {
        Arc::new(AlloyRpcClient::new())
    }

    /// The stored network record, with a hint when none was launched yet
    pub async fn load_network(&self) -> Result<Network> {
        let name = &self.settings.network_name;
        match self.repository.get_network(name).await {
            Ok(network) => Ok(network),
            Err(CapabilityError::NotFound { .. }) => {
                Err::<Network, _>(OrchestratorError::not_found("network", name))
                    .context("No network record found, run `devnet launch-network` first")
            }
            Err(e) => {
                Err::<Network, _>(e).with_context(|| format!("Failed to load network {}", name))
            }
        }
    }
}
