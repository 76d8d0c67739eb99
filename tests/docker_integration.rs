//! End-to-end run against a real Docker daemon.
//!
//! Needs `git` and a running Docker daemon with access to the busybox image.
//! Run with: cargo test --test docker_integration -- --ignored

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use repo_runner::execution::DockerConnector;
use repo_runner::lifecycle::{Interrupt, Orchestrator, TracingReporter};
use repo_runner::source::GitCli;
use repo_runner::RunConfig;

/// Interrupts the run after a fixed delay.
struct AfterDelay(Duration);

#[async_trait]
impl Interrupt for AfterDelay {
    async fn wait(&self) {
        tokio::time::sleep(self.0).await;
    }
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git should be installed");
    assert!(status.success(), "git {:?} failed", args);
}

fn create_source_repo(dir: &Path) {
    std::fs::write(
        dir.join("Dockerfile"),
        "FROM busybox\nEXPOSE 8080\nCMD [\"httpd\", \"-f\", \"-p\", \"8080\"]\n",
    )
    .expect("write Dockerfile");
    git(dir, &["init", "-q"]);
    git(dir, &["add", "Dockerfile"]);
    git(
        dir,
        &[
            "-c",
            "user.name=repo-runner",
            "-c",
            "user.email=repo-runner@example.com",
            "commit",
            "-q",
            "-m",
            "init",
        ],
    );
}

#[tokio::test]
#[ignore] // Run with: cargo test --test docker_integration -- --ignored
async fn test_full_lifecycle() {
    let source = tempfile::tempdir().expect("tempdir");
    create_source_repo(source.path());

    let orchestrator = Orchestrator::new(
        Arc::new(GitCli::new()),
        Arc::new(DockerConnector::new()),
        Arc::new(AfterDelay(Duration::from_secs(2))),
        Arc::new(TracingReporter),
    );
    let config = RunConfig::new(source.path().to_string_lossy()).with_ports(8080, 19090);

    let summary = orchestrator.run(&config).await.expect("run should succeed");

    assert_eq!(summary.host_port, 19090);
    assert_eq!(summary.cleanup.outcomes.len(), 3);
    assert_eq!(summary.cleanup.failures(), 0, "{:?}", summary.cleanup);
    assert!(!summary.working_directory.exists());
}
