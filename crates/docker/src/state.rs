use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct TrackedContainer {
    pub node_name: String,
    pub container_id: String,
    pub state: ContainerState,
}

/// Containers created by one `DockerManager`, keyed by container id
#[derive(Clone, Default)]
pub struct ContainerRegistry {
    containers: Arc<RwLock<HashMap<String, TrackedContainer>>>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn track_created(&self, node_name: String, container_id: String) {
        let mut containers = self.containers.write().await;
        containers.insert(
            container_id.clone(),
            TrackedContainer {
                node_name,
                container_id,
                state: ContainerState::Created,
            },
        );
    }

    pub async fn set_state(&self, container_id: &str, state: ContainerState) {
        let mut containers = self.containers.write().await;
        if let Some(container) = containers.get_mut(container_id) {
            container.state = state;
        }
    }

    pub async fn remove(&self, container_id: &str) -> Option<TrackedContainer> {
        self.containers.write().await.remove(container_id)
    }
}
