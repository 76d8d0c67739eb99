//! Lifecycle events and the reporter capability that renders them.

use std::path::Path;

use crate::error::{CleanupFailure, SetupFailure};
use crate::execution::ContainerHandle;

/// Something worth telling the user about during a run.
#[derive(Debug)]
pub enum LifecycleEvent<'a> {
    WorkingDirectoryReady { path: &'a Path, owned: bool },
    Cloning { url: &'a str, path: &'a Path },
    ConnectingEngine,
    Building { tag: &'a str },
    Starting { name: &'a str },
    ContainerRunning { container: &'a ContainerHandle },
    WaitingForInterrupt,
    Interrupted,
    CleanupStarted,
    CleanupStep { action: &'a str },
    CleanupFailed { failure: &'a CleanupFailure },
    CleanupFinished { failures: usize },
    SetupFailed { failure: &'a SetupFailure },
}

/// Receives lifecycle events.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &LifecycleEvent<'_>);
}

impl std::fmt::Display for LifecycleEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::WorkingDirectoryReady { path, owned } => {
                let kind = if *owned { "generated" } else { "supplied" };
                write!(f, "Using {} working directory {}", kind, path.display())
            }
            LifecycleEvent::Cloning { url, path } => {
                write!(f, "Cloning repo {} into {}...", url, path.display())
            }
            LifecycleEvent::ConnectingEngine => write!(f, "Initializing docker client..."),
            LifecycleEvent::Building { tag } => write!(f, "Building docker image {}...", tag),
            LifecycleEvent::Starting { name } => {
                write!(f, "Starting docker container {}...", name)
            }
            LifecycleEvent::ContainerRunning { container } => write!(
                f,
                "Docker container is running. Check it on {}",
                container.local_url()
            ),
            LifecycleEvent::WaitingForInterrupt => write!(f, "To stop container press `Ctrl+C`"),
            LifecycleEvent::Interrupted => write!(f, "Interrupt received, shutting down"),
            LifecycleEvent::CleanupStarted => write!(f, "Cleaning up"),
            LifecycleEvent::CleanupStep { action } => write!(f, "Cleanup: {}", action),
            LifecycleEvent::CleanupFailed { failure } => {
                write!(f, "Cleanup step failed: {}", failure)
            }
            LifecycleEvent::CleanupFinished { failures } => {
                write!(f, "Cleanup finished with {} failure(s)", failures)
            }
            LifecycleEvent::SetupFailed { failure } => write!(f, "{}", failure),
        }
    }
}

/// Reports events through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &LifecycleEvent<'_>) {
        match event {
            LifecycleEvent::SetupFailed { .. } => tracing::error!("{}", event),
            LifecycleEvent::WorkingDirectoryReady { .. }
            | LifecycleEvent::CleanupStarted
            | LifecycleEvent::CleanupStep { .. }
            | LifecycleEvent::CleanupFailed { .. }
            | LifecycleEvent::CleanupFinished { .. } => tracing::debug!("{}", event),
            _ => tracing::info!("{}", event),
        }
    }
}
