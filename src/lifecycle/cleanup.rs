//! Ordered best-effort release of run resources.
//!
//! Every action in a [`CleanupPlan`] is attempted, in order, regardless of
//! how earlier actions went. Failures are reported and recorded, never
//! propagated.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{CleanupFailure, EngineError};
use crate::execution::{ContainerHandle, Engine};
use crate::lifecycle::events::{LifecycleEvent, Reporter};
use crate::lifecycle::workdir::WorkingDirectory;

/// A single release step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CleanupAction {
    StopContainer { id: String, name: String },
    RemoveImage { tag: String },
    RemoveDirectory { path: PathBuf },
}

impl std::fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupAction::StopContainer { name, .. } => write!(f, "stop container {}", name),
            CleanupAction::RemoveImage { tag } => write!(f, "remove image {}", tag),
            CleanupAction::RemoveDirectory { path } => {
                write!(f, "remove directory {}", path.display())
            }
        }
    }
}

/// Result of one attempted action.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupOutcome {
    pub action: CleanupAction,
    pub error: Option<String>,
}

impl CleanupOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes of a whole cleanup pass, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub outcomes: Vec<CleanupOutcome>,
}

impl CleanupReport {
    /// Number of actions that failed.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }

    /// Actions in the order they were attempted.
    pub fn attempted(&self) -> Vec<&CleanupAction> {
        self.outcomes.iter().map(|o| &o.action).collect()
    }
}

/// Fixed-order list of release steps for the resources a run acquired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan {
    actions: Vec<CleanupAction>,
}

impl CleanupPlan {
    /// Builds the plan: stop container, remove image, remove directory.
    ///
    /// Only resources that exist are included. Caller-supplied working
    /// directories are never removed.
    pub fn new(
        container: Option<&ContainerHandle>,
        image_tag: Option<&str>,
        workdir: Option<&WorkingDirectory>,
    ) -> Self {
        let mut actions = Vec::with_capacity(3);

        if let Some(container) = container {
            actions.push(CleanupAction::StopContainer {
                id: container.id().to_string(),
                name: container.name().to_string(),
            });
        }
        if let Some(tag) = image_tag {
            actions.push(CleanupAction::RemoveImage {
                tag: tag.to_string(),
            });
        }
        if let Some(dir) = workdir.filter(|d| d.is_owned()) {
            actions.push(CleanupAction::RemoveDirectory {
                path: dir.path().to_path_buf(),
            });
        }

        Self { actions }
    }

    pub fn actions(&self) -> &[CleanupAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Attempts every action in order.
    pub async fn execute(
        &self,
        engine: Option<&dyn Engine>,
        reporter: &dyn Reporter,
    ) -> CleanupReport {
        reporter.report(&LifecycleEvent::CleanupStarted);

        let mut report = CleanupReport::default();
        for action in &self.actions {
            let description = action.to_string();
            reporter.report(&LifecycleEvent::CleanupStep {
                action: &description,
            });

            let error = match run_action(action, engine).await {
                Ok(()) => None,
                Err(failure) => {
                    reporter.report(&LifecycleEvent::CleanupFailed { failure: &failure });
                    Some(failure.to_string())
                }
            };

            report.outcomes.push(CleanupOutcome {
                action: action.clone(),
                error,
            });
        }

        reporter.report(&LifecycleEvent::CleanupFinished {
            failures: report.failures(),
        });
        report
    }
}

async fn run_action(
    action: &CleanupAction,
    engine: Option<&dyn Engine>,
) -> Result<(), CleanupFailure> {
    match action {
        CleanupAction::StopContainer { id, name } => {
            let engine = engine.ok_or_else(|| CleanupFailure::StopContainer {
                name: name.clone(),
                source: no_engine(),
            })?;
            engine
                .stop_container(id)
                .await
                .map_err(|source| CleanupFailure::StopContainer {
                    name: name.clone(),
                    source,
                })
        }
        CleanupAction::RemoveImage { tag } => {
            let engine = engine.ok_or_else(|| CleanupFailure::RemoveImage {
                tag: tag.clone(),
                source: no_engine(),
            })?;
            engine
                .remove_image(tag)
                .await
                .map_err(|source| CleanupFailure::RemoveImage {
                    tag: tag.clone(),
                    source,
                })
        }
        CleanupAction::RemoveDirectory { path } => tokio::fs::remove_dir_all(path)
            .await
            .map_err(|source| CleanupFailure::RemoveDirectory {
                path: path.clone(),
                source,
            }),
    }
}

fn no_engine() -> EngineError {
    EngineError::DaemonUnavailable("no engine connection".to_string())
}
