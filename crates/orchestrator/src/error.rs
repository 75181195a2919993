use domain::{CapabilityError, DomainError};
use ethereum::IdentityError;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Crypto failure: {0}")]
    CryptoFailure(String),

    #[error("IO failure at {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Precondition failed for node {node}: {reason}")]
    PreconditionFailed { node: String, reason: String },

    #[error("Timed out after {elapsed:?} waiting for {target}")]
    Timeout { target: String, elapsed: Duration },

    #[error("Node {node} did not recover within {elapsed:?}")]
    RecoveryTimeout { node: String, elapsed: Duration },

    #[error("Cancelled while {operation}")]
    Cancelled { operation: String },

    #[error("Restart of node {node} failed: {source}")]
    RestartFailure {
        node: String,
        #[source]
        source: CapabilityError,
    },

    #[error("{operation} failed for node {node}: {source}")]
    NodeOperation {
        node: String,
        operation: &'static str,
        #[source]
        source: CapabilityError,
    },

    #[error("Launch aborted at node {node} after starting [{}]: {source}", .started.join(", "))]
    LaunchAborted {
        node: String,
        started: Vec<String>,
        #[source]
        source: Box<OrchestratorError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl OrchestratorError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn precondition(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            node: node.into(),
            reason: reason.into(),
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    pub fn node_operation(
        node: impl Into<String>,
        operation: &'static str,
        source: CapabilityError,
    ) -> Self {
        Self::NodeOperation {
            node: node.into(),
            operation,
            source,
        }
    }

    /// Deadline exceeded, as opposed to an outright failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::RecoveryTimeout { .. })
    }

    /// Also true for a launch aborted by cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } => true,
            Self::LaunchAborted { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

impl From<IdentityError> for OrchestratorError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Crypto(message) | IdentityError::Parse(message) => {
                Self::CryptoFailure(message)
            }
            IdentityError::Io { path, source } => Self::IoFailure { path, source },
            IdentityError::NotFound(path) => {
                Self::not_found("private key", path.display().to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_are_distinguishable() {
        let timeout = OrchestratorError::Timeout {
            target: "alice".to_string(),
            elapsed: Duration::from_secs(10),
        };
        let recovery = OrchestratorError::RecoveryTimeout {
            node: "bob".to_string(),
            elapsed: Duration::from_secs(60),
        };
        assert!(timeout.is_timeout());
        assert!(recovery.is_timeout());
        assert!(!OrchestratorError::cancelled("waiting").is_timeout());
        assert!(OrchestratorError::cancelled("waiting").is_cancelled());
        assert!(!OrchestratorError::Configuration("x".to_string()).is_timeout());
    }

    #[test]
    fn test_launch_aborted_names_node() {
        let err = OrchestratorError::LaunchAborted {
            node: "driss".to_string(),
            started: vec!["alice".to_string(), "bob".to_string(), "cassandra".to_string()],
            source: Box::new(OrchestratorError::node_operation(
                "driss",
                "start container",
                CapabilityError::operation("port already allocated"),
            )),
        };
        let message = err.to_string();
        assert!(message.contains("driss"));
        assert!(message.contains("alice, bob, cassandra"));
        assert!(message.contains("port already allocated"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_launch_reports_cancellation() {
        let err = OrchestratorError::LaunchAborted {
            node: "alice".to_string(),
            started: Vec::new(),
            source: Box::new(OrchestratorError::cancelled("launching alice")),
        };
        assert!(err.is_cancelled());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_identity_errors_map_to_taxonomy() {
        let err: OrchestratorError = IdentityError::Parse("bad hex".to_string()).into();
        assert!(matches!(err, OrchestratorError::CryptoFailure(_)));

        let err: OrchestratorError =
            IdentityError::NotFound(PathBuf::from("/k/alice-private.key")).into();
        assert!(matches!(err, OrchestratorError::NotFound { resource: "private key", .. }));
    }
}
