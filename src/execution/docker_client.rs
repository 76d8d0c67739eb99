//! Docker API wrapper using the bollard crate.
//!
//! This module provides the [`Engine`] implementation used in production.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use bollard::image::{BuildImageOptions, RemoveImageOptions};
use bollard::models::{HostConfig, PortBinding};
use bollard::Docker;
use futures::StreamExt;

use crate::error::EngineError;
use crate::execution::container::{BuildSpec, ContainerHandle, ContainerSpec};
use crate::execution::context::pack_build_context;
use crate::execution::engine::{Engine, EngineConnector};

/// Seconds Docker waits after SIGTERM before sending SIGKILL.
const STOP_TIMEOUT_SECS: i64 = 10;

/// Connects to the local Docker daemon.
#[derive(Debug, Clone, Default)]
pub struct DockerConnector;

impl DockerConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EngineConnector for DockerConnector {
    async fn connect(&self) -> Result<Arc<dyn Engine>, EngineError> {
        let client = DockerClient::new()?;
        client.ping().await?;
        Ok(Arc::new(client))
    }
}

/// Docker client wrapper for image and container operations.
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Creates a new Docker client using the local defaults (socket or `DOCKER_HOST`).
    ///
    /// No request is sent; use [`DockerClient::ping`] to check reachability.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DaemonUnavailable` if the connection settings are invalid.
    pub fn new() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| EngineError::DaemonUnavailable(format!("Failed to connect: {e}")))?;

        Ok(Self { docker })
    }

    /// Creates a new Docker client from an existing bollard Docker instance.
    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }

    /// Checks that the daemon answers.
    pub async fn ping(&self) -> Result<(), EngineError> {
        self.docker
            .ping()
            .await
            .map_err(|e| EngineError::DaemonUnavailable(format!("Ping failed: {e}")))?;
        Ok(())
    }

    async fn remove_container_forced(&self, id: &str) -> Result<(), EngineError> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| EngineError::RunFailed(format!("Failed to remove container: {e}")))
    }
}

#[async_trait]
impl Engine for DockerClient {
    async fn build_image(&self, context_dir: &Path, spec: &BuildSpec) -> Result<(), EngineError> {
        let context = pack_build_context(context_dir, &spec.dockerfile)?;

        let options = BuildImageOptions {
            dockerfile: spec.dockerfile.clone(),
            t: spec.tag.clone(),
            rm: true,
            forcerm: true,
            ..Default::default()
        };

        let mut stream = self.docker.build_image(options, None, Some(context.into()));

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| EngineError::BuildFailed(e.to_string()))?;

            if let Some(error) = info.error {
                return Err(EngineError::BuildFailed(error));
            }
            if let Some(line) = info.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    tracing::debug!(tag = %spec.tag, "{}", line);
                }
            }
        }

        Ok(())
    }

    async fn run_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle, EngineError> {
        let port_key = spec.port_key();

        let exposed_ports: HashMap<String, HashMap<(), ()>> =
            [(port_key.clone(), HashMap::new())].into_iter().collect();
        let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = [(
            port_key,
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(spec.host_port.to_string()),
            }]),
        )]
        .into_iter()
        .collect();

        let host_config = HostConfig {
            port_bindings: Some(port_bindings),
            auto_remove: Some(spec.auto_remove),
            ..Default::default()
        };

        let container_config = Config {
            image: Some(spec.image.clone()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), container_config)
            .await
            .map_err(|e| EngineError::RunFailed(format!("Failed to create container: {e}")))?;

        if let Err(e) = self
            .docker
            .start_container(&response.id, None::<StartContainerOptions<String>>)
            .await
        {
            // A created but never started container is not auto-removed.
            if let Err(remove_err) = self.remove_container_forced(&response.id).await {
                tracing::warn!(
                    "Failed to remove unstarted container {}: {}",
                    spec.name,
                    remove_err
                );
            }
            return Err(EngineError::RunFailed(format!(
                "Failed to start container: {e}"
            )));
        }

        Ok(ContainerHandle::new(response.id, spec))
    }

    async fn stop_container(&self, id: &str) -> Result<(), EngineError> {
        let options = StopContainerOptions {
            t: STOP_TIMEOUT_SECS,
        };

        self.docker
            .stop_container(id, Some(options))
            .await
            .map_err(|e| EngineError::StopFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn remove_image(&self, tag: &str) -> Result<(), EngineError> {
        let options = RemoveImageOptions {
            force: true,
            ..Default::default()
        };

        self.docker
            .remove_image(tag, Some(options), None)
            .await
            .map_err(|e| EngineError::RemoveFailed {
                tag: tag.to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}
