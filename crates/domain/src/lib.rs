//! Domain model for a private multi-node chain deployment
//!
//! This crate holds the `Network` aggregate and its `Node` entities together with
//! their status state machines and the quorum health predicate. It also defines the
//! capability traits the orchestrator drives (container runtime, chain RPC, user
//! feedback, persistence) so concrete backends can be swapped without touching the
//! orchestration logic.

pub mod error;
pub mod feedback;
pub mod network;
pub mod node;
pub mod repository;
pub mod rpc;
pub mod runtime;

pub use alloy::primitives::{Address, U256};
pub use error::{CapabilityError, CapabilityResult, DomainError};
pub use feedback::{Feedback, ProgressTracker, Spinner};
pub use network::{HEALTH_QUORUM, Network, NetworkMetrics, NetworkStatus};
pub use node::{ClientKind, Node, NodeMetrics, NodeStatus};
pub use repository::NetworkRepository;
pub use rpc::ChainRpc;
pub use runtime::{ContainerRef, ContainerRuntime, ContainerSpec, ContainerStats};
