//! repo-runner: clone a repository, build its Dockerfile and run the image.
//!
//! The container keeps running until Ctrl-C, after which the container,
//! the image and the temporary checkout are removed.

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod lifecycle;
pub mod source;

pub use config::RunConfig;
pub use error::{CleanupFailure, EngineError, FetchError, SetupFailure, SetupStep};
pub use lifecycle::{Orchestrator, RunSummary};
