use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "devnet")]
#[command(about = "Launch and exercise a private multi-node chain network", long_about = None)]
pub struct Cli {
    /// Settings file (missing file means defaults)
    #[arg(
        long,
        global = true,
        env = "DEVNET_CONFIG",
        default_value = orchestrator::DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Override the directory holding keystores, data dirs and network records
    #[arg(long, global = true, env = "DEVNET_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Override the network name
    #[arg(long, global = true, env = "DEVNET_NETWORK")]
    pub network: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate identities and genesis, then start every node and wait for quorum
    LaunchNetwork,

    /// Show the status of every node
    Infos {
        /// Refresh every N seconds until interrupted
        #[arg(long, env = "DEVNET_INFOS_UPDATE")]
        update: Option<u64>,
    },

    /// Stop a node, keep it down, then restart it
    TemporaryFailure {
        /// Name of the node to take down (e.g. alice)
        node: String,

        /// Seconds the node stays down
        #[arg(long, env = "DEVNET_FAILURE_DOWNTIME")]
        downtime: Option<u64>,
    },

    /// Run a transaction scenario
    Scenario {
        /// 0, 1, 2, 3 or init, transfers, erc20, replacement
        scenario: String,
    },

    /// Stop and remove every node container
    StopNetwork,

    /// Generate identities and the genesis file without starting anything
    Genesis,

    /// Container runtime utilities
    Docker {
        #[command(subcommand)]
        subcommand: DockerCommands,
    },

    /// Generate a fresh node identity
    Keypair {
        /// Also persist the identity under this directory
        #[arg(long, env = "DEVNET_KEYPAIR_OUTPUT")]
        output: Option<PathBuf>,

        /// File name stem used with --output
        #[arg(long, env = "DEVNET_KEYPAIR_NAME", default_value = "node")]
        name: String,
    },
}

#[derive(Subcommand)]
pub enum DockerCommands {
    /// Check the Docker daemon is reachable and list managed containers
    Check,
}
