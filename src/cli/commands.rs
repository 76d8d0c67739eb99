//! CLI definition and entry point for repo-runner.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::warn;

use crate::config::{
    RunConfig, DEFAULT_CONTAINER_PORT, DEFAULT_DOCKERFILE, DEFAULT_HOST_PORT, DEFAULT_REPO_URL,
};
use crate::error::SetupFailure;
use crate::execution::DockerConnector;
use crate::lifecycle::{CtrlC, Orchestrator, RunSummary, TracingReporter};
use crate::source::GitCli;

/// Multi-character short flags clap cannot express, rewritten to their long form.
const LEGACY_FLAGS: &[(&str, &str)] = &[("-d_p", "--docker_port"), ("-h_p", "--host_port")];

/// Download repository, build Dockerfile from it and run it.
#[derive(Parser, Debug)]
#[command(name = "repo-runner")]
#[command(about = "Download repository, build Dockerfile from it and run it")]
#[command(version)]
#[command(
    long_about = "repo-runner clones a git repository, builds the Dockerfile found in it, runs the image with a single port mapping and waits for Ctrl+C. On interrupt the container is stopped and the image and temporary checkout are removed.\n\nExample usage:\n  repo-runner -r https://github.com/org/app.git -d_p 8080 -h_p 9090"
)]
pub struct Cli {
    /// Url to the git repository to clone.
    #[arg(short = 'r', long = "repo_url", env = "REPO_RUNNER_REPO_URL", default_value = DEFAULT_REPO_URL)]
    pub repo_url: String,

    /// Existing directory the project is cloned into. Defaults to a fresh temporary directory.
    #[arg(short = 'p', long = "path", value_parser = existing_dir)]
    pub path: Option<PathBuf>,

    /// Serving port inside the Docker container (-d_p).
    #[arg(long = "docker_port", default_value_t = DEFAULT_CONTAINER_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    pub docker_port: u16,

    /// Serving port on the host (-h_p).
    #[arg(long = "host_port", default_value_t = DEFAULT_HOST_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    pub host_port: u16,

    /// Branch or tag to clone.
    #[arg(long)]
    pub branch: Option<String>,

    /// Create a shallow clone with this many commits.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: Option<u32>,

    /// Dockerfile path relative to the repository root.
    #[arg(long, default_value = DEFAULT_DOCKERFILE)]
    pub dockerfile: String,

    /// Tag for the built image. Defaults to a per-run tag.
    #[arg(long)]
    pub image_tag: Option<String>,

    /// Name for the container. Defaults to a per-run name.
    #[arg(long)]
    pub container_name: Option<String>,

    /// Remove already-created resources when a setup step fails.
    #[arg(long)]
    pub cleanup_on_failure: bool,

    /// Print a JSON run summary to stdout on exit.
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Builds the run configuration from the parsed flags.
    pub fn to_run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.repo_url)
            .with_ports(self.docker_port, self.host_port)
            .with_dockerfile(&self.dockerfile)
            .with_cleanup_on_failure(self.cleanup_on_failure);

        if let Some(path) = &self.path {
            config = config.with_path(path);
        }
        if let Some(branch) = &self.branch {
            config = config.with_branch(branch);
        }
        if let Some(depth) = self.depth {
            config = config.with_depth(depth);
        }
        if let Some(tag) = &self.image_tag {
            config = config.with_image_tag(tag);
        }
        if let Some(name) = &self.container_name {
            config = config.with_container_name(name);
        }
        config
    }
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else if path.exists() {
        Err(format!("Path '{value}' is not a directory."))
    } else {
        Err(format!("Path '{value}' does not exist."))
    }
}

/// Rewrites `-d_p`/`-h_p` (and their `=value` forms) to the long flags.
///
/// Arguments after a bare `--` are left untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            for (legacy, long) in LEGACY_FLAGS {
                if text == *legacy {
                    return OsString::from(*long);
                }
                if let Some(value) = text
                    .strip_prefix(legacy)
                    .and_then(|rest| rest.strip_prefix('='))
                {
                    return OsString::from(format!("{long}={value}"));
                }
            }
            arg
        })
        .collect()
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running.
pub fn parse_cli() -> Cli {
    Cli::parse_from(normalize_args(std::env::args_os()))
}

/// Run repo-runner with the parsed arguments.
///
/// Blocks until Ctrl+C and returns after cleanup. A setup failure has
/// already been logged when it is returned.
pub async fn run_with_cli(cli: Cli) -> Result<RunSummary, SetupFailure> {
    let config = cli.to_run_config();

    let fetcher = GitCli::new()
        .with_branch(config.branch.clone())
        .with_depth(config.depth);
    let orchestrator = Orchestrator::new(
        Arc::new(fetcher),
        Arc::new(DockerConnector::new()),
        Arc::new(CtrlC),
        Arc::new(TracingReporter),
    );

    let summary = orchestrator.run(&config).await?;

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!("Failed to serialize run summary: {}", e),
        }
    }

    Ok(summary)
}
