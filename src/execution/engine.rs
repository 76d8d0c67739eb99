//! Engine client traits.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::execution::container::{BuildSpec, ContainerHandle, ContainerSpec};

/// Opens a connection to a container engine.
#[async_trait]
pub trait EngineConnector: Send + Sync {
    /// Connects to the engine.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DaemonUnavailable` if the engine cannot be reached.
    async fn connect(&self) -> Result<Arc<dyn Engine>, EngineError>;
}

/// A live engine connection, held for the whole run.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Builds an image from `context_dir` and tags it with `spec.tag`.
    async fn build_image(&self, context_dir: &Path, spec: &BuildSpec) -> Result<(), EngineError>;

    /// Creates and starts a detached container.
    async fn run_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle, EngineError>;

    /// Stops a running container.
    async fn stop_container(&self, id: &str) -> Result<(), EngineError>;

    /// Removes an image by tag.
    async fn remove_image(&self, tag: &str) -> Result<(), EngineError>;
}
