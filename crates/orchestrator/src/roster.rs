//! Node roster: one immutable descriptor per network member

use crate::constants::*;
use crate::error::{OrchestratorError, Result};
use crate::genesis::GenesisBuilder;
use alloy::primitives::Address;
use domain::{ClientKind, Node};
use ethereum::{Identity, ether, persist_identity};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name and client of each default roster member, in launch order.
/// The first [`DEFAULT_VALIDATOR_COUNT`] members are validators.
const DEFAULT_MEMBERS: [(&str, ClientKind); DEFAULT_ROSTER_SIZE] = [
    ("alice", ClientKind::Geth),
    ("bob", ClientKind::Geth),
    ("cassandra", ClientKind::Nethermind),
    ("driss", ClientKind::Geth),
    ("elena", ClientKind::Nethermind),
];

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub name: String,
    pub is_validator: bool,
    pub client: ClientKind,
    pub peer_port: u16,
    pub rpc_port: u16,
    pub ws_port: u16,
    pub identity: Identity,
    pub data_dir: PathBuf,
    pub keystore_dir: PathBuf,
}

impl NodeConfig {
    pub fn new(
        name: impl Into<String>,
        is_validator: bool,
        client: ClientKind,
        peer_port: u16,
        rpc_port: u16,
        identity: Identity,
        nodes_dir: &Path,
    ) -> Self {
        let name = name.into();
        let node_dir = nodes_dir.join(&name);
        Self {
            is_validator,
            client,
            peer_port,
            rpc_port,
            ws_port: rpc_port + WS_PORT_OFFSET,
            identity,
            data_dir: node_dir.join("data"),
            keystore_dir: node_dir.join("keystore"),
            name,
        }
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }

    pub fn container_name(&self) -> String {
        format!("{}{}", CONTAINER_NAME_PREFIX, self.name)
    }

    /// Domain entity for this member, `Offline` and without a container
    pub fn to_node(&self) -> Node {
        Node::new(
            self.name.clone(),
            self.is_validator,
            self.client,
            self.address(),
            self.peer_port,
            self.rpc_port,
            self.ws_port,
        )
    }
}

/// Build the fixed five-member roster with fresh identities.
///
/// Fails as a whole if any identity cannot be generated.
pub fn generate_default_set(nodes_dir: &Path) -> Result<Vec<NodeConfig>> {
    let mut configs = Vec::with_capacity(DEFAULT_ROSTER_SIZE);

    for (index, (name, client)) in DEFAULT_MEMBERS.iter().enumerate() {
        let identity = Identity::generate()?;
        let offset = index as u16;
        configs.push(NodeConfig::new(
            *name,
            index < DEFAULT_VALIDATOR_COUNT,
            *client,
            BASE_PEER_PORT + offset,
            BASE_RPC_PORT + offset,
            identity,
            nodes_dir,
        ));
        debug!("Assigned identity {} to {}", configs[index].address(), name);
    }

    check_unique(&configs)?;
    Ok(configs)
}

/// Names and every port must be distinct across the roster
pub fn check_unique(configs: &[NodeConfig]) -> Result<()> {
    let mut names = HashSet::new();
    let mut ports = HashSet::new();

    for config in configs {
        if !names.insert(config.name.as_str()) {
            return Err(OrchestratorError::Configuration(format!(
                "duplicate node name {}",
                config.name
            )));
        }
        for port in [config.peer_port, config.rpc_port, config.ws_port] {
            if !ports.insert(port) {
                return Err(OrchestratorError::Configuration(format!(
                    "port {} of node {} is already taken",
                    port, config.name
                )));
            }
        }
    }
    Ok(())
}

pub fn by_name<'a>(configs: &'a [NodeConfig], name: &str) -> Option<&'a NodeConfig> {
    configs.iter().find(|c| c.name == name)
}

pub fn validators_of(configs: &[NodeConfig]) -> Vec<Address> {
    configs.iter().filter(|c| c.is_validator).map(|c| c.address()).collect()
}

pub fn all_addresses_of(configs: &[NodeConfig]) -> Vec<Address> {
    configs.iter().map(|c| c.address()).collect()
}

/// Register validators in roster order and fund everyone else
pub fn genesis_from_roster(configs: &[NodeConfig], builder: &mut GenesisBuilder) {
    for config in configs {
        if config.is_validator {
            builder.add_validator(config.address());
        } else {
            builder.add_allocation(config.address(), ether(NON_VALIDATOR_BALANCE_ETHER));
        }
    }
}

/// Persist every identity into its keystore and create the data directories
pub fn save_all(configs: &[NodeConfig]) -> Result<()> {
    for config in configs {
        persist_identity(&config.identity, &config.keystore_dir, &config.name)?;
        std::fs::create_dir_all(&config.data_dir)
            .map_err(|e| OrchestratorError::io(&config.data_dir, e))?;
    }
    info!("🔑 Saved {} node identities", configs.len());
    Ok(())
}
