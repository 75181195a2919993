//! Lifecycle orchestration for a private multi-node chain network
//!
//! Generates node identities and the genesis document, launches one container
//! per node in a fixed order, waits for the validator quorum, injects temporary
//! node failures and reports network status. Backends are reached only through
//! the capability traits of the `domain` crate.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod failure;
pub mod genesis;
pub mod launch;
pub mod monitor;
pub mod node_lock;
pub mod readiness;
pub mod repository;
pub mod roster;
pub mod scenario;
pub mod teardown;

pub use config::{DEFAULT_CONFIG_PATH, PollBudget, Settings};
pub use error::{OrchestratorError, Result};
pub use failure::FailureInjector;
pub use genesis::{GenesisBuilder, GenesisSpec};
pub use launch::{LaunchOrchestrator, LaunchSummary, network_from_roster, prepare};
pub use monitor::{NetworkMonitor, NodeSnapshot};
pub use node_lock::{NodeLockGuard, NodeLockManager};
pub use readiness::{Poller, await_network, await_node};
pub use repository::{InMemoryRepository, JsonFileRepository};
pub use roster::NodeConfig;
pub use scenario::{ScenarioKind, ScenarioRunner, UnsupportedScenarios};
pub use teardown::{NetworkTeardown, TeardownSummary};
