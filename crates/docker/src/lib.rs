pub mod container;
pub mod error;
pub mod state;

pub use container::{DockerManager, MANAGED_LABEL, NODE_LABEL};
pub use error::{DockerError, Result};
pub use state::{ContainerRegistry, ContainerState, TrackedContainer};
