//! Container engine layer for repo-runner.
//!
//! Wraps the bollard crate behind the [`EngineConnector`] and [`Engine`]
//! traits so the lifecycle orchestrator never talks to Docker directly.
//!
//! # Architecture
//!
//! Resources created through an engine follow this order:
//! ```text
//! CONNECT → BUILD IMAGE → RUN CONTAINER → (wait) → STOP CONTAINER → REMOVE IMAGE
//! ```
//!
//! # Example
//!
//! ```ignore
//! use repo_runner::execution::{BuildSpec, ContainerSpec, DockerConnector, EngineConnector};
//!
//! let engine = DockerConnector::new().connect().await?;
//! engine.build_image(checkout, &BuildSpec::new("my-image")).await?;
//! let container = engine
//!     .run_container(&ContainerSpec::new("my-container", "my-image", 8080, 9090))
//!     .await?;
//! engine.stop_container(container.id()).await?;
//! engine.remove_image("my-image").await?;
//! ```

pub mod container;
pub mod context;
pub mod docker_client;
pub mod engine;

pub use container::{BuildSpec, ContainerHandle, ContainerSpec};
pub use context::pack_build_context;
pub use docker_client::{DockerClient, DockerConnector};
pub use engine::{Engine, EngineConnector};
