//! Settings loaded from devnet.toml

use crate::constants::*;
use crate::error::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default path of the optional settings file
pub const DEFAULT_CONFIG_PATH: &str = "./devnet.toml";

/// A timeout paired with its polling interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollBudget {
    pub fn from_secs(timeout_secs: u64, interval_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            interval: Duration::from_secs(interval_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Root of generated artifacts: keystores, data dirs, genesis, network records
    pub base_dir: PathBuf,
    pub network_name: String,
    /// Docker network the node containers join
    pub docker_network: String,
    pub chain_id: u64,
    pub block_period_secs: u64,
    pub epoch_length: u64,
    pub geth_image: String,
    pub nethermind_image: String,
    /// Host the JSON-RPC ports are published on
    pub rpc_host: String,
    pub node_ready_timeout_secs: u64,
    pub node_ready_interval_secs: u64,
    pub network_ready_timeout_secs: u64,
    pub network_ready_interval_secs: u64,
    pub failure_downtime_secs: u64,
    pub recovery_timeout_secs: u64,
    pub recovery_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./.devnet"),
            network_name: "devnet-network".to_string(),
            docker_network: "devnet-network".to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            block_period_secs: DEFAULT_BLOCK_PERIOD_SECS,
            epoch_length: DEFAULT_EPOCH_LENGTH,
            geth_image: DEFAULT_GETH_IMAGE.to_string(),
            nethermind_image: DEFAULT_NETHERMIND_IMAGE.to_string(),
            rpc_host: "localhost".to_string(),
            node_ready_timeout_secs: NODE_READY_TIMEOUT_SECS,
            node_ready_interval_secs: NODE_READY_INTERVAL_SECS,
            network_ready_timeout_secs: NETWORK_READY_TIMEOUT_SECS,
            network_ready_interval_secs: NETWORK_READY_INTERVAL_SECS,
            failure_downtime_secs: FAILURE_DOWNTIME_SECS,
            recovery_timeout_secs: RECOVERY_TIMEOUT_SECS,
            recovery_interval_secs: RECOVERY_INTERVAL_SECS,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file.
    ///
    /// A missing file yields the defaults; a present but invalid file is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            debug!("{:?} not found, using default settings", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| OrchestratorError::io(path, e))?;
        let settings: Self = toml::from_str(&contents).map_err(|e| {
            OrchestratorError::Configuration(format!("invalid {}: {}", path.display(), e))
        })?;
        settings.validate()?;

        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_network_name(mut self, name: impl Into<String>) -> Self {
        self.network_name = name.into();
        self
    }

    pub fn with_failure_downtime(mut self, secs: u64) -> Self {
        self.failure_downtime_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain_id == 0 {
            return Err(OrchestratorError::Configuration(
                "chain_id must be greater than 0".to_string(),
            ));
        }
        if self.block_period_secs == 0 {
            return Err(OrchestratorError::Configuration(
                "block_period_secs must be greater than 0".to_string(),
            ));
        }

        let budgets = [
            (
                "node readiness",
                self.node_ready_timeout_secs,
                self.node_ready_interval_secs,
            ),
            (
                "network readiness",
                self.network_ready_timeout_secs,
                self.network_ready_interval_secs,
            ),
            ("recovery", self.recovery_timeout_secs, self.recovery_interval_secs),
        ];
        for (name, timeout, interval) in budgets {
            if interval == 0 {
                return Err(OrchestratorError::Configuration(format!(
                    "{} interval must be greater than 0",
                    name
                )));
            }
            if interval >= timeout {
                return Err(OrchestratorError::Configuration(format!(
                    "{} interval ({}s) must be shorter than its timeout ({}s)",
                    name, interval, timeout
                )));
            }
        }

        Ok(())
    }

    pub fn node_readiness(&self) -> PollBudget {
        PollBudget::from_secs(self.node_ready_timeout_secs, self.node_ready_interval_secs)
    }

    pub fn network_readiness(&self) -> PollBudget {
        PollBudget::from_secs(self.network_ready_timeout_secs, self.network_ready_interval_secs)
    }

    pub fn recovery(&self) -> PollBudget {
        PollBudget::from_secs(self.recovery_timeout_secs, self.recovery_interval_secs)
    }

    pub fn failure_downtime(&self) -> Duration {
        Duration::from_secs(self.failure_downtime_secs)
    }

    pub fn nodes_dir(&self) -> PathBuf {
        self.base_dir.join("nodes")
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.base_dir.join("genesis.json")
    }

    pub fn networks_dir(&self) -> PathBuf {
        self.base_dir.join("networks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.chain_id, 1337);
        assert_eq!(settings.failure_downtime(), Duration::from_secs(40));
        assert_eq!(settings.recovery(), PollBudget::from_secs(60, 3));
        assert_eq!(settings.network_readiness(), PollBudget::from_secs(60, 5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::from_file(dir.path().join("devnet.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_parse_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("devnet.toml");
        std::fs::write(
            &path,
            r#"
base_dir = "/tmp/chain"
chain_id = 4242
failure_downtime_secs = 10
"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/tmp/chain"));
        assert_eq!(settings.chain_id, 4242);
        assert_eq!(settings.failure_downtime_secs, 10);
        // untouched fields keep their defaults
        assert_eq!(settings.epoch_length, 30000);
        assert_eq!(settings.genesis_path(), PathBuf::from("/tmp/chain/genesis.json"));
    }

    #[test]
    fn test_validate_rejects_bad_budgets() {
        let mut settings = Settings::default();
        settings.recovery_interval_secs = 0;
        assert!(matches!(settings.validate(), Err(OrchestratorError::Configuration(_))));

        let mut settings = Settings::default();
        settings.node_ready_interval_secs = settings.node_ready_timeout_secs;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.chain_id = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("devnet.toml");
        std::fs::write(&path, "chain_id = \"not a number\"").unwrap();
        assert!(matches!(Settings::from_file(&path), Err(OrchestratorError::Configuration(_))));
    }
}
