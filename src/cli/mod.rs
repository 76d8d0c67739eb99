//! Command-line interface for repo-runner.
//!
//! Provides flag parsing (including the legacy `-d_p`/`-h_p` spellings) and
//! the wiring from parsed arguments to the lifecycle orchestrator.

mod commands;

pub use commands::{normalize_args, parse_cli, run_with_cli, Cli};
