//! Network persistence: one JSON document per network, or in memory

use async_trait::async_trait;
use domain::{CapabilityError, CapabilityResult, Network, NetworkRepository, Node};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Stores `<dir>/<network name>.json`
pub struct JsonFileRepository {
    dir: PathBuf,
    // Serializes read-modify-write cycles of update_node
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path_for(&self, network_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", network_name))
    }

    async fn read(&self, network_name: &str) -> CapabilityResult<Network> {
        let path = self.path_for(network_name);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CapabilityError::not_found("network", network_name));
            }
            Err(e) => return Err(io_error(&path, e)),
        };
        serde_json::from_str(&contents).map_err(|e| {
            CapabilityError::operation(format!("corrupt network record {}: {}", path.display(), e))
        })
    }

    async fn write(&self, network: &Network) -> CapabilityResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let path = self.path_for(&network.name);
        let json = serde_json::to_string_pretty(network).map_err(|e| {
            CapabilityError::operation(format!("cannot encode network {}: {}", network.name, e))
        })?;
        tokio::fs::write(&path, json).await.map_err(|e| io_error(&path, e))?;
        debug!("Saved network {} to {:?}", network.name, path);
        Ok(())
    }
}

fn io_error(path: &Path, e: io::Error) -> CapabilityError {
    CapabilityError::operation(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl NetworkRepository for JsonFileRepository {
    async fn save_network(&self, network: &Network) -> CapabilityResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(network).await
    }

    async fn get_network(&self, name: &str) -> CapabilityResult<Network> {
        self.read(name).await
    }

    async fn delete_network(&self, name: &str) -> CapabilityResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CapabilityError::not_found("network", name))
            }
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn update_node(&self, network_name: &str, node: &Node) -> CapabilityResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut network = self.read(network_name).await?;
        let stored = network
            .node_mut(&node.name)
            .ok_or_else(|| CapabilityError::not_found("node", &node.name))?;
        *stored = node.clone();
        network.refresh_metrics();
        self.write(&network).await
    }

    async fn get_node(&self, network_name: &str, node_name: &str) -> CapabilityResult<Node> {
        let network = self.read(network_name).await?;
        network
            .node(node_name)
            .cloned()
            .ok_or_else(|| CapabilityError::not_found("node", node_name))
    }
}

#[derive(Default)]
pub struct InMemoryRepository {
    networks: Mutex<HashMap<String, Network>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NetworkRepository for InMemoryRepository {
    async fn save_network(&self, network: &Network) -> CapabilityResult<()> {
        self.networks.lock().await.insert(network.name.clone(), network.clone());
        Ok(())
    }

    async fn get_network(&self, name: &str) -> CapabilityResult<Network> {
        self.networks
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| CapabilityError::not_found("network", name))
    }

    async fn delete_network(&self, name: &str) -> CapabilityResult<()> {
        self.networks
            .lock()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CapabilityError::not_found("network", name))
    }

    async fn update_node(&self, network_name: &str, node: &Node) -> CapabilityResult<()> {
        let mut networks = self.networks.lock().await;
        let network = networks
            .get_mut(network_name)
            .ok_or_else(|| CapabilityError::not_found("network", network_name))?;
        let stored = network
            .node_mut(&node.name)
            .ok_or_else(|| CapabilityError::not_found("node", &node.name))?;
        *stored = node.clone();
        network.refresh_metrics();
        Ok(())
    }

    async fn get_node(&self, network_name: &str, node_name: &str) -> CapabilityResult<Node> {
        let networks = self.networks.lock().await;
        networks
            .get(network_name)
            .and_then(|n| n.node(node_name))
            .cloned()
            .ok_or_else(|| CapabilityError::not_found("node", node_name))
    }
}
