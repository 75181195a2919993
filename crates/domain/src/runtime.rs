//! Container runtime capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{CapabilityError, CapabilityResult};

/// Opaque handle to a container created by a runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerRef(String);

impl ContainerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, the way `docker ps` shows ids
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a runtime needs to create one node container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// Overrides the image entrypoint when set
    pub entrypoint: Option<Vec<String>>,
    pub command: Vec<String>,
    pub env_vars: HashMap<String, String>,
    /// "<container port>/tcp" -> host port
    pub port_bindings: BTreeMap<String, u16>,
    /// "host_path:container_path"
    pub volume_binds: Vec<String>,
    pub network_mode: Option<String>,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    pub memory_limit_bytes: u64,
}

/// Operations the orchestrator needs from a container runtime.
///
/// Optional operations default to [`CapabilityError::NotSupported`] so callers
/// can branch on their absence.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Name of the backend, used in error messages
    fn provider(&self) -> &str;

    /// Check the runtime is reachable
    async fn ping(&self) -> CapabilityResult<()>;

    /// Create the shared network. Succeeds if it already exists.
    async fn create_network(&self, name: &str) -> CapabilityResult<()>;

    async fn remove_network(&self, name: &str) -> CapabilityResult<()> {
        let _ = name;
        Err(CapabilityError::not_supported("remove_network", self.provider()))
    }

    async fn create_container(
        &self,
        node_name: &str,
        spec: &ContainerSpec,
    ) -> CapabilityResult<ContainerRef>;

    async fn start(&self, container: &ContainerRef) -> CapabilityResult<()>;

    async fn stop(&self, container: &ContainerRef) -> CapabilityResult<()>;

    async fn restart(&self, container: &ContainerRef) -> CapabilityResult<()> {
        let _ = container;
        Err(CapabilityError::not_supported("restart", self.provider()))
    }

    async fn remove(&self, container: &ContainerRef) -> CapabilityResult<()>;

    async fn is_running(&self, container: &ContainerRef) -> CapabilityResult<bool>;

    async fn stats(&self, container: &ContainerRef) -> CapabilityResult<ContainerStats> {
        let _ = container;
        Err(CapabilityError::not_supported("stats", self.provider()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Minimal;

    #[async_trait]
    impl ContainerRuntime for Minimal {
        fn provider(&self) -> &str {
            "minimal"
        }
        async fn ping(&self) -> CapabilityResult<()> {
            Ok(())
        }
        async fn create_network(&self, _name: &str) -> CapabilityResult<()> {
            Ok(())
        }
        async fn create_container(
            &self,
            node_name: &str,
            _spec: &ContainerSpec,
        ) -> CapabilityResult<ContainerRef> {
            Ok(ContainerRef::new(node_name))
        }
        async fn start(&self, _container: &ContainerRef) -> CapabilityResult<()> {
            Ok(())
        }
        async fn stop(&self, _container: &ContainerRef) -> CapabilityResult<()> {
            Ok(())
        }
        async fn remove(&self, _container: &ContainerRef) -> CapabilityResult<()> {
            Ok(())
        }
        async fn is_running(&self, _container: &ContainerRef) -> CapabilityResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_optional_operations_report_not_supported() {
        let runtime = Minimal;
        let container = ContainerRef::new("abc");
        let err = runtime.stats(&container).await.unwrap_err();
        assert!(err.is_not_supported());
        assert_eq!(err.to_string(), "stats is not supported by minimal");
        assert!(runtime.restart(&container).await.unwrap_err().is_not_supported());
    }

    #[test]
    fn test_short_id() {
        let id = ContainerRef::new("0123456789abcdef0123");
        assert_eq!(id.short(), "0123456789ab");
        assert_eq!(ContainerRef::new("abc").short(), "abc");
    }
}
