//! Error types shared by the domain model and capability implementations

use std::fmt;
use thiserror::Error;

use crate::network::NetworkStatus;
use crate::node::NodeStatus;

/// Result type for capability operations
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Error returned by any capability implementation (runtime, RPC, repository)
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// The backend does not implement this operation
    #[error("{capability} is not supported by {provider}")]
    NotSupported {
        capability: String,
        provider: String,
    },

    /// The backend could not be reached
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// The backend was reached but the operation failed
    #[error("Operation failed: {message}")]
    Operation { message: String },

    /// Resource not found
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CapabilityError {
    pub fn not_supported(capability: impl Into<String>, provider: impl fmt::Display) -> Self {
        Self::NotSupported {
            capability: capability.into(),
            provider: provider.to_string(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by the domain model itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node {node}: invalid status transition {from} -> {to}")]
    InvalidTransition {
        node: String,
        from: NodeStatus,
        to: NodeStatus,
    },

    #[error("network {network}: invalid status transition {from} -> {to}")]
    InvalidNetworkTransition {
        network: String,
        from: NetworkStatus,
        to: NetworkStatus,
    },

    #[error("node {0} is already a member of the network")]
    DuplicateNode(String),
}
