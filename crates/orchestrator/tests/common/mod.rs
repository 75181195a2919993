//! Fake capabilities shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use domain::{
    Address, CapabilityError, CapabilityResult, ChainRpc, ContainerRef, ContainerRuntime,
    ContainerSpec, ContainerStats, Feedback, Network, NetworkRepository, Node, NodeStatus,
    ProgressTracker, Spinner, U256,
};
use orchestrator::InMemoryRepository;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Container runtime that records every call and keeps containers in memory
#[derive(Default)]
pub struct RecordingRuntime {
    pub ops: Mutex<Vec<String>>,
    running: Mutex<HashSet<String>>,
    fail_start: Mutex<Option<String>>,
    start_keeps_stopped: AtomicBool,
    hang_inspection_after_start: AtomicBool,
    started_once: AtomicBool,
}

impl RecordingRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn container_for(node_name: &str) -> ContainerRef {
        ContainerRef::new(format!("ctr-{}", node_name))
    }

    /// Make `start` fail for this node's container
    pub fn fail_start_of(&self, node_name: &str) {
        *self.fail_start.lock() = Some(Self::container_for(node_name).to_string());
    }

    /// `start` succeeds but the container never reports running
    pub fn keep_stopped_after_start(&self) {
        self.start_keeps_stopped.store(true, Ordering::SeqCst);
    }

    /// Once `start` was called, `is_running` never answers
    pub fn hang_inspection_after_start(&self) {
        self.hang_inspection_after_start.store(true, Ordering::SeqCst);
    }

    pub fn set_running(&self, node_name: &str) {
        self.running.lock().insert(Self::container_for(node_name).to_string());
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().clone()
    }

    fn record(&self, op: &str, target: &str) {
        self.ops.lock().push(format!("{}:{}", op, target));
    }
}

#[async_trait]
impl ContainerRuntime for RecordingRuntime {
    fn provider(&self) -> &str {
        "recording"
    }

    async fn ping(&self) -> CapabilityResult<()> {
        Ok(())
    }

    async fn create_network(&self, name: &str) -> CapabilityResult<()> {
        self.record("create_network", name);
        Ok(())
    }

    async fn remove_network(&self, name: &str) -> CapabilityResult<()> {
        self.record("remove_network", name);
        Ok(())
    }

    async fn create_container(
        &self,
        node_name: &str,
        _spec: &ContainerSpec,
    ) -> CapabilityResult<ContainerRef> {
        self.record("create", node_name);
        Ok(Self::container_for(node_name))
    }

    async fn start(&self, container: &ContainerRef) -> CapabilityResult<()> {
        self.record("start", container.as_str());
        if self.fail_start.lock().as_deref() == Some(container.as_str()) {
            return Err(CapabilityError::operation("port already allocated"));
        }
        self.started_once.store(true, Ordering::SeqCst);
        if !self.start_keeps_stopped.load(Ordering::SeqCst) {
            self.running.lock().insert(container.to_string());
        }
        Ok(())
    }

    async fn stop(&self, container: &ContainerRef) -> CapabilityResult<()> {
        self.record("stop", container.as_str());
        self.running.lock().remove(container.as_str());
        Ok(())
    }

    async fn remove(&self, container: &ContainerRef) -> CapabilityResult<()> {
        self.record("remove", container.as_str());
        self.running.lock().remove(container.as_str());
        Ok(())
    }

    async fn is_running(&self, container: &ContainerRef) -> CapabilityResult<bool> {
        self.record("is_running", container.as_str());
        if self.hang_inspection_after_start.load(Ordering::SeqCst)
            && self.started_once.load(Ordering::SeqCst)
        {
            std::future::pending::<()>().await;
        }
        Ok(self.running.lock().contains(container.as_str()))
    }

    async fn stats(&self, container: &ContainerRef) -> CapabilityResult<ContainerStats> {
        if self.running.lock().contains(container.as_str()) {
            Ok(ContainerStats {
                cpu_percent: 5.0,
                memory_bytes: 256 * 1024 * 1024,
                memory_limit_bytes: 0,
            })
        } else {
            Err(CapabilityError::operation("container not running"))
        }
    }
}

/// Chain RPC answering from fixed values; endpoints in `down` refuse every call
pub struct ScriptedRpc {
    pub connects: AtomicU32,
    down: Mutex<HashSet<String>>,
    latest_block: u64,
    peers: u64,
}

impl ScriptedRpc {
    pub fn new(latest_block: u64, peers: u64) -> Arc<Self> {
        Arc::new(Self {
            connects: AtomicU32::new(0),
            down: Mutex::new(HashSet::new()),
            latest_block,
            peers,
        })
    }

    pub fn take_down(&self, endpoint: &str) {
        self.down.lock().insert(endpoint.to_string());
    }

    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    fn check(&self, endpoint: &str) -> CapabilityResult<()> {
        if self.down.lock().contains(endpoint) {
            Err(CapabilityError::connection(format!("{} refused", endpoint)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainRpc for ScriptedRpc {
    fn provider(&self) -> &str {
        "scripted"
    }

    async fn connect(&self, endpoint: &str) -> CapabilityResult<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.check(endpoint)
    }

    async fn latest_block_number(&self, endpoint: &str) -> CapabilityResult<u64> {
        self.check(endpoint)?;
        Ok(self.latest_block)
    }

    async fn peer_count(&self, endpoint: &str) -> CapabilityResult<u64> {
        self.check(endpoint)?;
        Ok(self.peers)
    }

    async fn balance(&self, endpoint: &str, _address: Address) -> CapabilityResult<U256> {
        self.check(endpoint)?;
        Ok(ethereum::ether(1000))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    Progress { title: String, current: u64 },
    ProgressDone { title: String },
    ProgressFailed { title: String },
    SpinnerDone(String),
    SpinnerFailed(String),
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
}

/// Feedback sink that keeps every event
#[derive(Default, Clone)]
pub struct RecordingFeedback {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingFeedback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Progress values reported under `title`, in order
    pub fn progress_of(&self, title: &str) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress { title: t, current } if t == title => Some(current),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> Vec<Vec<Vec<String>>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Table { rows, .. } => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Warning(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

struct RecordingProgress {
    title: String,
    sink: RecordingFeedback,
}

impl ProgressTracker for RecordingProgress {
    fn update(&mut self, current: u64, _message: &str) {
        self.sink.push(Event::Progress {
            title: self.title.clone(),
            current,
        });
    }

    fn complete(&mut self, _message: &str) {
        self.sink.push(Event::ProgressDone {
            title: self.title.clone(),
        });
    }

    fn error(&mut self, _message: &str) {
        self.sink.push(Event::ProgressFailed {
            title: self.title.clone(),
        });
    }
}

struct RecordingSpinner {
    sink: RecordingFeedback,
}

impl Spinner for RecordingSpinner {
    fn update(&mut self, _message: &str) {}

    fn success(&mut self, message: &str) {
        self.sink.push(Event::SpinnerDone(message.to_string()));
    }

    fn error(&mut self, message: &str) {
        self.sink.push(Event::SpinnerFailed(message.to_string()));
    }
}

impl Feedback for RecordingFeedback {
    fn info(&self, message: &str) {
        self.push(Event::Info(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.push(Event::Success(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(Event::Warning(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Event::Error(message.to_string()));
    }

    fn start_progress(&self, title: &str, _total: u64) -> Box<dyn ProgressTracker> {
        Box::new(RecordingProgress {
            title: title.to_string(),
            sink: self.clone(),
        })
    }

    fn start_spinner(&self, _message: &str) -> Box<dyn Spinner> {
        Box::new(RecordingSpinner { sink: self.clone() })
    }

    fn display_table(&self, headers: &[&str], rows: &[Vec<String>]) {
        self.push(Event::Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.to_vec(),
        });
    }
}

/// In-memory repository that also remembers every node update
#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryRepository,
    pub node_updates: Mutex<Vec<(String, NodeStatus)>>,
}

impl RecordingRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn node_updates(&self) -> Vec<(String, NodeStatus)> {
        self.node_updates.lock().clone()
    }
}

#[async_trait]
impl NetworkRepository for RecordingRepository {
    async fn save_network(&self, network: &Network) -> CapabilityResult<()> {
        self.inner.save_network(network).await
    }

    async fn get_network(&self, name: &str) -> CapabilityResult<Network> {
        self.inner.get_network(name).await
    }

    async fn delete_network(&self, name: &str) -> CapabilityResult<()> {
        self.inner.delete_network(name).await
    }

    async fn update_node(&self, network_name: &str, node: &Node) -> CapabilityResult<()> {
        self.node_updates.lock().push((node.name.clone(), node.status()));
        self.inner.update_node(network_name, node).await
    }

    async fn get_node(&self, network_name: &str, node_name: &str) -> CapabilityResult<Node> {
        self.inner.get_node(network_name, node_name).await
    }
}
