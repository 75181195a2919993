//! Clique genesis assembly and the geth-compatible genesis document

use crate::constants::*;
use crate::error::{OrchestratorError, Result};
use alloy::primitives::{Address, U256};
use ethereum::ether;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Immutable chain parameters, signer set and initial balances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisSpec {
    pub chain_id: u64,
    pub period_secs: u64,
    pub epoch_length: u64,
    /// Signers in insertion order
    pub validators: Vec<Address>,
    /// Initial balances in wei
    pub alloc: BTreeMap<Address, U256>,
}

impl GenesisSpec {
    /// `32 zero bytes | signer addresses | 65 zero bytes`
    pub fn extra_data(&self) -> Vec<u8> {
        let mut extra = Vec::with_capacity(
            EXTRA_DATA_VANITY_LEN + self.validators.len() * 20 + EXTRA_DATA_SEAL_LEN,
        );
        extra.extend_from_slice(&[0u8; EXTRA_DATA_VANITY_LEN]);
        for validator in &self.validators {
            extra.extend_from_slice(validator.as_slice());
        }
        extra.extend_from_slice(&[0u8; EXTRA_DATA_SEAL_LEN]);
        extra
    }

    pub fn to_document(&self) -> GenesisDocument {
        GenesisDocument {
            config: ChainConfig::clique(self.chain_id, self.period_secs, self.epoch_length),
            nonce: "0x0".to_string(),
            timestamp: "0x0".to_string(),
            extra_data: format!("0x{}", hex::encode(self.extra_data())),
            gas_limit: format!("{:#x}", GENESIS_GAS_LIMIT),
            difficulty: format!("{:#x}", GENESIS_DIFFICULTY),
            mix_hash: format!("0x{}", "0".repeat(64)),
            coinbase: format!("0x{}", "0".repeat(40)),
            alloc: self
                .alloc
                .iter()
                .map(|(address, balance)| {
                    (
                        hex::encode(address.as_slice()),
                        GenesisAccount {
                            balance: format!("0x{:x}", balance),
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Accumulates signers and allocations, then builds one [`GenesisSpec`]
#[derive(Debug, Clone)]
pub struct GenesisBuilder {
    chain_id: u64,
    period_secs: u64,
    epoch_length: u64,
    validators: Vec<Address>,
    alloc: BTreeMap<Address, U256>,
}

impl Default for GenesisBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID, DEFAULT_BLOCK_PERIOD_SECS, DEFAULT_EPOCH_LENGTH)
    }
}

impl GenesisBuilder {
    pub fn new(chain_id: u64, period_secs: u64, epoch_length: u64) -> Self {
        Self {
            chain_id,
            period_secs,
            epoch_length,
            validators: Vec::new(),
            alloc: BTreeMap::new(),
        }
    }

    /// Append a signer and fund it with the validator allocation
    pub fn add_validator(&mut self, address: Address) -> &mut Self {
        self.validators.push(address);
        self.alloc.insert(address, ether(VALIDATOR_BALANCE_ETHER));
        self
    }

    /// Set the initial balance (in wei) of any address, replacing an earlier one
    pub fn add_allocation(&mut self, address: Address, balance: U256) -> &mut Self {
        self.alloc.insert(address, balance);
        self
    }

    pub fn build(&self) -> Result<GenesisSpec> {
        if self.validators.is_empty() {
            return Err(OrchestratorError::Configuration(
                "genesis needs at least one validator".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for validator in &self.validators {
            if !seen.insert(validator) {
                return Err(OrchestratorError::Configuration(format!(
                    "validator {} registered twice",
                    validator
                )));
            }
        }

        Ok(GenesisSpec {
            chain_id: self.chain_id,
            period_secs: self.period_secs,
            epoch_length: self.epoch_length,
            validators: self.validators.clone(),
            alloc: self.alloc.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisDocument {
    pub config: ChainConfig,
    pub nonce: String,
    pub timestamp: String,
    pub extra_data: String,
    pub gas_limit: String,
    pub difficulty: String,
    pub mix_hash: String,
    pub coinbase: String,
    pub alloc: BTreeMap<String, GenesisAccount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,
    pub homestead_block: u64,
    #[serde(rename = "eip150Block")]
    pub eip150_block: u64,
    #[serde(rename = "eip155Block")]
    pub eip155_block: u64,
    #[serde(rename = "eip158Block")]
    pub eip158_block: u64,
    pub byzantium_block: u64,
    pub constantinople_block: u64,
    pub petersburg_block: u64,
    pub istanbul_block: u64,
    pub berlin_block: u64,
    pub london_block: u64,
    pub clique: CliqueConfig,
}

impl ChainConfig {
    /// Every fork active from block 0
    fn clique(chain_id: u64, period: u64, epoch: u64) -> Self {
        Self {
            chain_id,
            homestead_block: 0,
            eip150_block: 0,
            eip155_block: 0,
            eip158_block: 0,
            byzantium_block: 0,
            constantinople_block: 0,
            petersburg_block: 0,
            istanbul_block: 0,
            berlin_block: 0,
            london_block: 0,
            clique: CliqueConfig { period, epoch },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CliqueConfig {
    pub period: u64,
    pub epoch: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenesisAccount {
    pub balance: String,
}

/// Write the genesis document as pretty JSON, creating parent directories.
///
/// The document is written next to the target and renamed into place.
pub fn save(spec: &GenesisSpec, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| OrchestratorError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(&spec.to_document())?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json).map_err(|e| OrchestratorError::io(&tmp_path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| OrchestratorError::io(path, e))?;

    debug!("Genesis extra data is {} bytes", spec.extra_data().len());
    info!(
        "📜 Genesis written to {:?} ({} validators, {} allocations)",
        path,
        spec.validators.len(),
        spec.alloc.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn address(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_extra_data_layout() {
        for n in 1..=5u8 {
            let mut builder = GenesisBuilder::default();
            for i in 1..=n {
                builder.add_validator(address(i));
            }
            let extra = builder.build().unwrap().extra_data();

            assert_eq!(extra.len(), 32 + 20 * n as usize + 65);
            assert!(extra[..32].iter().all(|b| *b == 0));
            for i in 0..n as usize {
                let start = 32 + 20 * i;
                assert_eq!(&extra[start..start + 20], address(i as u8 + 1).as_slice());
            }
            assert!(extra[32 + 20 * n as usize..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn test_zero_validators_is_configuration_error() {
        let mut builder = GenesisBuilder::default();
        builder.add_allocation(address(9), ether(10));
        assert!(matches!(builder.build(), Err(OrchestratorError::Configuration(_))));
    }

    #[test]
    fn test_duplicate_validator_rejected() {
        let mut builder = GenesisBuilder::default();
        builder.add_validator(address(1)).add_validator(address(1));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_build_is_deterministic() {
        let build = || {
            let mut builder = GenesisBuilder::default();
            builder
                .add_validator(address(3))
                .add_validator(address(1))
                .add_validator(address(2))
                .add_allocation(address(7), ether(10));
            builder.build().unwrap()
        };
        let (a, b) = (build(), build());
        assert_eq!(a.extra_data(), b.extra_data());
        assert_eq!(a, b);
        // Insertion order, not sorted
        assert_eq!(a.validators, vec![address(3), address(1), address(2)]);
    }

    #[test]
    fn test_allocations() {
        let mut builder = GenesisBuilder::default();
        builder.add_validator(address(1)).add_allocation(address(2), ether(10));
        let spec = builder.build().unwrap();
        assert_eq!(spec.alloc[&address(1)], ether(1000));
        assert_eq!(spec.alloc[&address(2)], ether(10));
    }

    #[test]
    fn test_save_writes_geth_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("genesis.json");

        let mut builder = GenesisBuilder::new(1337, 5, 30000);
        builder.add_validator(address(0xaa)).add_allocation(address(0x11), ether(10));
        let spec = builder.build().unwrap();
        save(&spec, &path).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["config"]["chainId"], 1337);
        assert_eq!(doc["config"]["eip155Block"], 0);
        assert_eq!(doc["config"]["clique"]["period"], 5);
        assert_eq!(doc["config"]["clique"]["epoch"], 30000);
        assert_eq!(doc["gasLimit"], "0x7a1200");
        assert_eq!(doc["difficulty"], "0x1");
        assert_eq!(
            doc["extraData"].as_str().unwrap().len(),
            2 + 2 * (32 + 20 + 65)
        );
        // 1000 ether
        assert_eq!(doc["alloc"]["aa".repeat(20)]["balance"], "0x3635c9adc5dea00000");
        // 10 ether
        assert_eq!(doc["alloc"]["11".repeat(20)]["balance"], "0x8ac7230489e80000");
        assert!(!dir.path().join("nested").join("genesis.json.tmp").exists());
    }
}
