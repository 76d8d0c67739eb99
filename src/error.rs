//! Error types for repo-runner operations.
//!
//! Two tiers:
//! - [`SetupFailure`]: anything that goes wrong before the container is
//!   running. Always fatal, always exits the process with status 1.
//! - [`CleanupFailure`]: anything that goes wrong while tearing down.
//!   Always recorded and suppressed.
//!
//! The collaborator errors ([`FetchError`], [`EngineError`]) are carried as
//! causes inside those two tiers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the source fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to spawn git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git exited with code {code}: {stderr}")]
    Exited { code: i32, stderr: String },

    #[error("git was terminated by a signal: {stderr}")]
    Terminated { stderr: String },
}

/// Errors that can occur during Docker operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Docker daemon not available: {0}")]
    DaemonUnavailable(String),

    #[error("Docker build failed: {0}")]
    BuildFailed(String),

    #[error("Docker run failed: {0}")]
    RunFailed(String),

    #[error("Failed to stop container '{id}': {reason}")]
    StopFailed { id: String, reason: String },

    #[error("Failed to remove image '{tag}': {reason}")]
    RemoveFailed { tag: String, reason: String },

    #[error("Invalid build context: {0}")]
    InvalidContext(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The setup step a [`SetupFailure`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    WorkingDirectory,
    Fetch,
    EngineConnect,
    Build,
    Run,
}

impl std::fmt::Display for SetupStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupStep::WorkingDirectory => write!(f, "working directory"),
            SetupStep::Fetch => write!(f, "fetch"),
            SetupStep::EngineConnect => write!(f, "engine connect"),
            SetupStep::Build => write!(f, "build"),
            SetupStep::Run => write!(f, "run"),
        }
    }
}

/// Fatal error raised by one of the setup steps.
#[derive(Debug, Error)]
pub enum SetupFailure {
    #[error("Failed to prepare working directory {}. Error: {source}", path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to clone repository {url}. Error: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to initialize docker client. Error: {0}")]
    EngineConnect(#[source] EngineError),

    #[error("Failed to build docker image {tag}. Error: {source}")]
    Build {
        tag: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to start docker container {name}. Error: {source}")]
    Run {
        name: String,
        #[source]
        source: EngineError,
    },
}

impl SetupFailure {
    /// Returns the step that failed.
    pub fn step(&self) -> SetupStep {
        match self {
            SetupFailure::WorkingDirectory { .. } => SetupStep::WorkingDirectory,
            SetupFailure::Fetch { .. } => SetupStep::Fetch,
            SetupFailure::EngineConnect(_) => SetupStep::EngineConnect,
            SetupFailure::Build { .. } => SetupStep::Build,
            SetupFailure::Run { .. } => SetupStep::Run,
        }
    }

    /// Process exit status for this failure. Every setup failure exits 1.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Non-fatal error raised by one cleanup action.
#[derive(Debug, Error)]
pub enum CleanupFailure {
    #[error("Failed to stop container {name}: {source}")]
    StopContainer {
        name: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to remove image {tag}: {source}")]
    RemoveImage {
        tag: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to remove directory {}: {source}", path.display())]
    RemoveDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
