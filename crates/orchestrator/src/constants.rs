//! Centralized constants for the orchestrator crate
//!
//! Roster layout, genesis parameters, and polling budgets.

// =============================================================================
// Roster
// =============================================================================

/// Number of nodes in the default roster.
pub const DEFAULT_ROSTER_SIZE: usize = 5;

/// The first this-many roster members are validators.
pub const DEFAULT_VALIDATOR_COUNT: usize = 3;

/// Peer port of the first roster member; each following member takes the next port.
pub const BASE_PEER_PORT: u16 = 30303;

/// JSON-RPC port of the first roster member.
pub const BASE_RPC_PORT: u16 = 8545;

/// Websocket port = RPC port + this offset.
pub const WS_PORT_OFFSET: u16 = 1000;

/// Prefix of every node container name.
pub const CONTAINER_NAME_PREFIX: &str = "devnet-";

// =============================================================================
// Genesis
// =============================================================================

pub const DEFAULT_CHAIN_ID: u64 = 1337;

/// Seconds between sealed blocks.
pub const DEFAULT_BLOCK_PERIOD_SECS: u64 = 5;

/// Blocks between checkpoints that reset pending votes.
pub const DEFAULT_EPOCH_LENGTH: u64 = 30000;

/// Consensus family written into the network record.
pub const CONSENSUS_FAMILY: &str = "clique";

/// Initial balance of every validator, in ether.
pub const VALIDATOR_BALANCE_ETHER: u64 = 1000;

/// Initial balance of every non-validator, in ether.
pub const NON_VALIDATOR_BALANCE_ETHER: u64 = 10;

pub const GENESIS_GAS_LIMIT: u64 = 8_000_000;

pub const GENESIS_DIFFICULTY: u64 = 1;

/// Zero bytes before the signer list in the genesis extra data.
pub const EXTRA_DATA_VANITY_LEN: usize = 32;

/// Zero bytes after the signer list, filled with a seal later.
pub const EXTRA_DATA_SEAL_LEN: usize = 65;

// =============================================================================
// Images
// =============================================================================

/// Last geth line with Clique sealing.
pub const DEFAULT_GETH_IMAGE: &str = "ethereum/client-go:v1.13.15";

pub const DEFAULT_NETHERMIND_IMAGE: &str = "nethermind/nethermind:1.25.4";

// =============================================================================
// Polling (in seconds)
// =============================================================================

/// Per-node readiness budget during launch.
pub const NODE_READY_TIMEOUT_SECS: u64 = 60;

pub const NODE_READY_INTERVAL_SECS: u64 = 2;

/// Budget for the validator quorum to come up after all nodes started.
pub const NETWORK_READY_TIMEOUT_SECS: u64 = 60;

pub const NETWORK_READY_INTERVAL_SECS: u64 = 5;

/// How long a node stays down during failure injection.
pub const FAILURE_DOWNTIME_SECS: u64 = 40;

/// Budget for a restarted container to report running.
pub const RECOVERY_TIMEOUT_SECS: u64 = 60;

pub const RECOVERY_INTERVAL_SECS: u64 = 3;
