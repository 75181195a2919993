//! Transaction scenarios run against a live network

use async_trait::async_trait;
use domain::{CapabilityError, CapabilityResult, Network};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Fund the validators
    Init,
    /// Periodic ether transfers between two nodes
    Transfers,
    /// Token deployment and distribution
    Erc20,
    /// Pending transaction replaced with a higher fee
    Replacement,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] =
        [Self::Init, Self::Transfers, Self::Erc20, Self::Replacement];

    pub fn index(self) -> u8 {
        match self {
            Self::Init => 0,
            Self::Transfers => 1,
            Self::Erc20 => 2,
            Self::Replacement => 3,
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Transfers => "transfers",
            Self::Erc20 => "erc20",
            Self::Replacement => "replacement",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid scenario {0:?}, use 0, 1, 2, 3 or init, transfers, erc20, replacement")]
pub struct ParseScenarioError(String);

impl FromStr for ScenarioKind {
    type Err = ParseScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| wanted == kind.to_string() || wanted == kind.index().to_string())
            .ok_or_else(|| ParseScenarioError(s.to_string()))
    }
}

#[async_trait]
pub trait ScenarioRunner: Send + Sync {
    fn provider(&self) -> &str;

    async fn run(&self, kind: ScenarioKind, network: &Network) -> CapabilityResult<()>;
}

/// Runner for builds without transaction scenarios
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedScenarios;

#[async_trait]
impl ScenarioRunner for UnsupportedScenarios {
    fn provider(&self) -> &str {
        "devnet"
    }

    async fn run(&self, kind: ScenarioKind, _network: &Network) -> CapabilityResult<()> {
        Err(CapabilityError::not_supported(format!("scenario {}", kind), self.provider()))
    }
}
