//! Image and container descriptions, and the handle to a running container.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::DEFAULT_DOCKERFILE;

/// What to build and how to tag it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Tag applied to the built image.
    pub tag: String,
    /// Dockerfile path relative to the build context.
    pub dockerfile: String,
}

impl BuildSpec {
    /// Creates a build spec using the default `Dockerfile`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            dockerfile: DEFAULT_DOCKERFILE.to_string(),
        }
    }

    /// Sets the Dockerfile path.
    pub fn with_dockerfile(mut self, dockerfile: impl Into<String>) -> Self {
        self.dockerfile = dockerfile.into();
        self
    }
}

/// Configuration for a detached container with a single TCP port mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name.
    pub name: String,
    /// Image to run.
    pub image: String,
    /// Port inside the container.
    pub container_port: u16,
    /// Port on the host bound to `container_port`.
    pub host_port: u16,
    /// Let the engine remove the container once it stops.
    pub auto_remove: bool,
}

impl ContainerSpec {
    /// Creates a spec with auto-removal enabled.
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        container_port: u16,
        host_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            container_port,
            host_port,
            auto_remove: true,
        }
    }

    /// Port key in the engine's `<port>/<proto>` notation.
    pub fn port_key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }
}

/// A container started by an [`Engine`](crate::execution::Engine).
#[derive(Debug, Clone, Serialize)]
pub struct ContainerHandle {
    id: String,
    name: String,
    container_port: u16,
    host_port: u16,
    started_at: DateTime<Utc>,
}

impl ContainerHandle {
    /// Creates a handle for a container that has just been started.
    pub fn new(id: impl Into<String>, spec: &ContainerSpec) -> Self {
        Self {
            id: id.into(),
            name: spec.name.clone(),
            container_port: spec.container_port,
            host_port: spec.host_port,
            started_at: Utc::now(),
        }
    }

    /// Returns the engine-assigned container ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the port inside the container.
    pub fn container_port(&self) -> u16 {
        self.container_port
    }

    /// Returns the host port mapped to the container.
    pub fn host_port(&self) -> u16 {
        self.host_port
    }

    /// Returns when the container was started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds elapsed since the container was started.
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }

    /// URL the mapped service is reachable at from the host.
    pub fn local_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.host_port)
    }
}
