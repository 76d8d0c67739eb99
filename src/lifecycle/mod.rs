//! Lifecycle orchestration for a single run.
//!
//! # Architecture
//!
//! ```text
//! WORKDIR → FETCH → CONNECT → BUILD → RUN → WAIT → CLEANUP
//! ```
//!
//! Any failure before WAIT is a [`SetupFailure`](crate::error::SetupFailure)
//! and ends the run. CLEANUP attempts every release step for what was
//! acquired and never fails.

pub mod cleanup;
pub mod events;
pub mod interrupt;
pub mod orchestrator;
pub mod workdir;

pub use cleanup::{CleanupAction, CleanupOutcome, CleanupPlan, CleanupReport};
pub use events::{LifecycleEvent, Reporter, TracingReporter};
pub use interrupt::{CtrlC, Interrupt};
pub use orchestrator::{Orchestrator, RunSummary};
pub use workdir::WorkingDirectory;
