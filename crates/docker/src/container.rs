use crate::error::{DockerError, Result};
use crate::state::{ContainerRegistry, ContainerState};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{
    ContainerCreateBody, ContainerStatsResponse, HostConfig, NetworkCreateRequest, PortBinding,
};
use bollard::query_parameters::{
    CreateContainerOptions, InspectContainerOptions, InspectNetworkOptions, ListContainersOptions,
    RemoveContainerOptions, RestartContainerOptions, StartContainerOptions, StatsOptions,
    StopContainerOptions,
};
use domain::{CapabilityResult, ContainerRef, ContainerRuntime, ContainerSpec, ContainerStats};
use futures_util::stream::TryStreamExt;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Label put on every container this tool creates
pub const MANAGED_LABEL: &str = "devnet.managed";

/// Label carrying the node name
pub const NODE_LABEL: &str = "devnet.node.name";

const DEFAULT_STOP_TIMEOUT_SECS: i32 = 10;

pub struct DockerManager {
    docker: Docker,
    registry: ContainerRegistry,
    stop_timeout_secs: i32,
}

impl DockerManager {
    pub fn new() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| DockerError::ConnectionError(e.to_string()))?;

        Ok(Self {
            docker,
            registry: ContainerRegistry::new(),
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
        })
    }

    pub fn with_stop_timeout(mut self, secs: i32) -> Self {
        self.stop_timeout_secs = secs;
        self
    }

    /// Docker engine version string, for diagnostics
    pub async fn server_version(&self) -> Result<String> {
        let version = self
            .docker
            .version()
            .await
            .map_err(|e| DockerError::ConnectionError(e.to_string()))?;
        Ok(version.version.unwrap_or_else(|| "unknown".to_string()))
    }

    /// All containers (running or not) carrying the managed label, as (id, name, running)
    pub async fn list_managed_containers(&self) -> Result<Vec<(String, String, bool)>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![format!("{}=true", MANAGED_LABEL)]);

        let options = ListContainersOptions {
            all: true,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let id = c.id?;
                let name = c
                    .names
                    .and_then(|names| names.first().cloned())
                    .unwrap_or_default()
                    .trim_start_matches('/')
                    .to_string();
                let running = c.state.map(|s| s.to_string() == "running").unwrap_or(false);
                Some((id, name, running))
            })
            .collect())
    }

    fn build_container_config(&self, spec: &ContainerSpec) -> ContainerCreateBody {
        let env: Vec<String> = spec
            .env_vars
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();

        let mut port_bindings = HashMap::new();
        let mut exposed_ports = HashMap::new();
        for (container_port, host_port) in &spec.port_bindings {
            port_bindings.insert(
                container_port.clone(),
                Some(vec![PortBinding {
                    host_ip: Some("0.0.0.0".to_string()),
                    host_port: Some(host_port.to_string()),
                }]),
            );
            exposed_ports.insert(container_port.clone(), HashMap::new());
        }

        let host_config = HostConfig {
            port_bindings: if port_bindings.is_empty() {
                None
            } else {
                Some(port_bindings)
            },
            network_mode: spec.network_mode.clone(),
            binds: if spec.volume_binds.is_empty() {
                None
            } else {
                Some(spec.volume_binds.clone())
            },
            ..Default::default()
        };

        ContainerCreateBody {
            image: Some(spec.image.clone()),
            entrypoint: spec.entrypoint.clone(),
            cmd: Some(spec.command.clone()),
            env: Some(env),
            labels: if spec.labels.is_empty() {
                None
            } else {
                Some(spec.labels.clone())
            },
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            ..Default::default()
        }
    }

    /// Force-remove a container left over from an earlier run under the same name
    async fn remove_stale(&self, name: &str) -> Result<()> {
        let remove_options = Some(RemoveContainerOptions {
            force: true,
            ..Default::default()
        });

        match self.docker.remove_container(name, remove_options).await {
            Ok(_) => {
                info!("🧹 Removed stale container {}", name);
                Ok(())
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn cpu_percent(stats: &ContainerStatsResponse) -> f64 {
    let usage = |s: &Option<bollard::models::ContainerCpuStats>| {
        let s = s.as_ref();
        (
            s.and_then(|c| c.cpu_usage.as_ref()).and_then(|u| u.total_usage).unwrap_or(0),
            s.and_then(|c| c.system_cpu_usage).unwrap_or(0),
            s.and_then(|c| c.online_cpus).unwrap_or(1),
        )
    };
    let (total, system, cpus) = usage(&stats.cpu_stats);
    let (pre_total, pre_system, _) = usage(&stats.precpu_stats);

    let cpu_delta = total.saturating_sub(pre_total) as f64;
    let system_delta = system.saturating_sub(pre_system) as f64;
    if system_delta <= 0.0 {
        return 0.0;
    }
    cpu_delta / system_delta * cpus as f64 * 100.0
}

#[async_trait]
impl ContainerRuntime for DockerManager {
    fn provider(&self) -> &str {
        "docker"
    }

    async fn ping(&self) -> CapabilityResult<()> {
        self.docker
            .ping()
            .await
            .map_err(|e| DockerError::ConnectionError(e.to_string()))?;
        Ok(())
    }

    async fn create_network(&self, name: &str) -> CapabilityResult<()> {
        if self
            .docker
            .inspect_network(name, None::<InspectNetworkOptions>)
            .await
            .is_ok()
        {
            debug!("Docker network {} already exists", name);
            return Ok(());
        }

        let request = NetworkCreateRequest {
            name: name.to_string(),
            driver: Some("bridge".to_string()),
            ..Default::default()
        };
        self.docker.create_network(request).await.map_err(DockerError::from)?;
        info!("🌐 Created docker network {}", name);
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> CapabilityResult<()> {
        match self.docker.remove_network(name).await {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(DockerError::from(e).into()),
        }
    }

    async fn create_container(
        &self,
        node_name: &str,
        spec: &ContainerSpec,
    ) -> CapabilityResult<ContainerRef> {
        self.remove_stale(&spec.name).await?;

        let create_options = Some(CreateContainerOptions {
            name: Some(spec.name.clone()),
            platform: String::new(),
        });

        let container = self
            .docker
            .create_container(create_options, self.build_container_config(spec))
            .await
            .map_err(DockerError::from)?;

        debug!(
            "Created container {} for {}: image={}",
            &container.id[..12.min(container.id.len())],
            node_name,
            spec.image
        );
        self.registry
            .track_created(node_name.to_string(), container.id.clone())
            .await;
        Ok(ContainerRef::new(container.id))
    }

    async fn start(&self, container: &ContainerRef) -> CapabilityResult<()> {
        self.docker
            .start_container(container.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(DockerError::from)?;
        self.registry.set_state(container.as_str(), ContainerState::Running).await;
        Ok(())
    }

    async fn stop(&self, container: &ContainerRef) -> CapabilityResult<()> {
        let stop_options = Some(StopContainerOptions {
            t: Some(self.stop_timeout_secs),
            ..Default::default()
        });

        match self.docker.stop_container(container.as_str(), stop_options).await {
            Ok(()) => {}
            // 304: already stopped
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 304, .. }) => {
                debug!("Container {} was already stopped", container.short());
            }
            Err(e) => return Err(DockerError::from(e).into()),
        }
        self.registry.set_state(container.as_str(), ContainerState::Stopped).await;
        Ok(())
    }

    async fn restart(&self, container: &ContainerRef) -> CapabilityResult<()> {
        let options = Some(RestartContainerOptions {
            t: Some(self.stop_timeout_secs),
            ..Default::default()
        });
        self.docker
            .restart_container(container.as_str(), options)
            .await
            .map_err(DockerError::from)?;
        self.registry.set_state(container.as_str(), ContainerState::Running).await;
        Ok(())
    }

    async fn remove(&self, container: &ContainerRef) -> CapabilityResult<()> {
        let remove_options = Some(RemoveContainerOptions {
            force: true,
            v: true,
            link: false,
        });

        match self.docker.remove_container(container.as_str(), remove_options).await {
            Ok(()) => {}
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                warn!("Container {} was already removed", container.short());
            }
            Err(e) => return Err(DockerError::from(e).into()),
        }
        if let Some(tracked) = self.registry.remove(container.as_str()).await {
            debug!(
                "Removed container {} of {} (last seen {:?})",
                container.short(),
                tracked.node_name,
                tracked.state
            );
        }
        Ok(())
    }

    async fn is_running(&self, container: &ContainerRef) -> CapabilityResult<bool> {
        let details = self
            .docker
            .inspect_container(container.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(DockerError::from)?;
        Ok(details.state.and_then(|s| s.running).unwrap_or(false))
    }

    async fn stats(&self, container: &ContainerRef) -> CapabilityResult<ContainerStats> {
        let options = Some(StatsOptions {
            stream: false,
            one_shot: false,
        });
        let mut stream = self.docker.stats(container.as_str(), options);
        let stats = stream
            .try_next()
            .await
            .map_err(DockerError::from)?
            .ok_or_else(|| DockerError::ContainerNotFound(container.to_string()))?;

        let memory = stats.memory_stats.as_ref();
        Ok(ContainerStats {
            cpu_percent: cpu_percent(&stats),
            memory_bytes: memory.and_then(|m| m.usage).unwrap_or(0),
            memory_limit_bytes: memory.and_then(|m| m.limit).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{ContainerCpuStats, ContainerCpuUsage};
    use std::collections::BTreeMap;

    fn cpu(total: u64, system: u64) -> Option<ContainerCpuStats> {
        Some(ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total),
                ..Default::default()
            }),
            system_cpu_usage: Some(system),
            online_cpus: Some(2),
            ..Default::default()
        })
    }

    #[test]
    fn test_cpu_percent_from_deltas() {
        let stats = ContainerStatsResponse {
            cpu_stats: cpu(300, 2_000),
            precpu_stats: cpu(100, 1_000),
            ..Default::default()
        };
        // 200 / 1000 * 2 cpus
        assert!((cpu_percent(&stats) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_percent_without_previous_sample() {
        let stats = ContainerStatsResponse {
            cpu_stats: cpu(300, 2_000),
            precpu_stats: cpu(300, 2_000),
            ..Default::default()
        };
        assert_eq!(cpu_percent(&stats), 0.0);
    }

    #[test]
    fn test_container_config_maps_spec() {
        // Building the request body does not talk to the daemon
        let Ok(manager) = DockerManager::new() else {
            return;
        };

        let mut port_bindings = BTreeMap::new();
        port_bindings.insert("8545/tcp".to_string(), 8546);
        let mut labels = HashMap::new();
        labels.insert(MANAGED_LABEL.to_string(), "true".to_string());

        let spec = ContainerSpec {
            name: "devnet-bob".to_string(),
            image: "ethereum/client-go:v1.13.15".to_string(),
            entrypoint: Some(vec!["sh".to_string(), "-c".to_string()]),
            command: vec!["geth".to_string()],
            port_bindings,
            volume_binds: vec!["/tmp/bob:/data".to_string()],
            network_mode: Some("devnet-network".to_string()),
            labels,
            ..Default::default()
        };

        let body = manager.build_container_config(&spec);
        assert_eq!(body.image.as_deref(), Some("ethereum/client-go:v1.13.15"));
        assert_eq!(body.entrypoint, spec.entrypoint);
        let host = body.host_config.unwrap();
        let binding = host.port_bindings.unwrap()["8545/tcp"].clone().unwrap();
        assert_eq!(binding[0].host_port.as_deref(), Some("8546"));
        assert_eq!(host.binds.unwrap(), vec!["/tmp/bob:/data".to_string()]);
        assert_eq!(host.network_mode.as_deref(), Some("devnet-network"));
        assert!(body.exposed_ports.unwrap().contains_key("8545/tcp"));
    }
}
