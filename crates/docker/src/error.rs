use domain::CapabilityError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockerError {
    #[error("Docker connection failed: {0}")]
    ConnectionError(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Container operation failed: {0}")]
    ContainerError(String),

    #[error("Docker API error: {0:?}")]
    BollardError(#[from] bollard::errors::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DockerError>;

impl From<DockerError> for CapabilityError {
    fn from(err: DockerError) -> Self {
        match err {
            DockerError::ConnectionError(message) => CapabilityError::connection(message),
            DockerError::ContainerNotFound(id) => CapabilityError::not_found("container", id),
            DockerError::ContainerError(message) => CapabilityError::operation(message),
            DockerError::BollardError(bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            }) => CapabilityError::not_found("container", message),
            DockerError::BollardError(e) => CapabilityError::operation(e.to_string()),
            DockerError::Other(e) => CapabilityError::Other(e),
        }
    }
}
