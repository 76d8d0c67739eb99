//! The clone → build → run → wait → cleanup sequence.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::error::SetupFailure;
use crate::execution::{BuildSpec, ContainerHandle, ContainerSpec, Engine, EngineConnector};
use crate::lifecycle::cleanup::{CleanupPlan, CleanupReport};
use crate::lifecycle::events::{LifecycleEvent, Reporter};
use crate::lifecycle::interrupt::Interrupt;
use crate::lifecycle::workdir::WorkingDirectory;
use crate::source::SourceFetcher;

/// What a completed run did, emitted after cleanup.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub repo_url: String,
    pub working_directory: PathBuf,
    pub image_tag: String,
    pub container_name: String,
    pub container_id: String,
    pub host_port: u16,
    pub uptime_seconds: i64,
    pub cleanup: CleanupReport,
}

/// Resources acquired so far. Fields are filled strictly in step order.
#[derive(Default)]
struct Acquired {
    workdir: Option<WorkingDirectory>,
    engine: Option<Arc<dyn Engine>>,
    image_tag: Option<String>,
    container: Option<ContainerHandle>,
}

impl Acquired {
    fn cleanup_plan(&self) -> CleanupPlan {
        CleanupPlan::new(
            self.container.as_ref(),
            self.image_tag.as_deref(),
            self.workdir.as_ref(),
        )
    }
}

/// Drives one run against injected collaborators.
pub struct Orchestrator {
    fetcher: Arc<dyn SourceFetcher>,
    connector: Arc<dyn EngineConnector>,
    interrupt: Arc<dyn Interrupt>,
    reporter: Arc<dyn Reporter>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        connector: Arc<dyn EngineConnector>,
        interrupt: Arc<dyn Interrupt>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            fetcher,
            connector,
            interrupt,
            reporter,
        }
    }

    /// Runs the full lifecycle.
    ///
    /// Returns once the interrupt has fired and cleanup has finished. Cleanup
    /// failures are recorded in the summary and never turn into an error.
    ///
    /// # Errors
    ///
    /// Returns the [`SetupFailure`] of the first setup step that failed. It
    /// has already been reported when this returns. Acquired resources are
    /// released first only if `config.cleanup_on_failure` is set.
    pub async fn run(&self, config: &RunConfig) -> Result<RunSummary, SetupFailure> {
        let mut acquired = Acquired::default();

        let (working_directory, container) = match self.setup(config, &mut acquired).await {
            Ok(ready) => ready,
            Err(failure) => {
                self.reporter
                    .report(&LifecycleEvent::SetupFailed { failure: &failure });
                if config.cleanup_on_failure {
                    self.cleanup(&acquired).await;
                }
                return Err(failure);
            }
        };

        self.reporter.report(&LifecycleEvent::WaitingForInterrupt);
        self.interrupt.wait().await;
        self.reporter.report(&LifecycleEvent::Interrupted);

        let report = self.cleanup(&acquired).await;

        Ok(RunSummary {
            run_id: config.run_id,
            repo_url: config.repo_url.clone(),
            working_directory,
            image_tag: config.image_tag.clone(),
            container_name: container.name().to_string(),
            container_id: container.id().to_string(),
            host_port: container.host_port(),
            uptime_seconds: container.uptime_seconds(),
            cleanup: report,
        })
    }

    /// Steps 1-5. Returns the working directory and the running container.
    async fn setup(
        &self,
        config: &RunConfig,
        acquired: &mut Acquired,
    ) -> Result<(PathBuf, ContainerHandle), SetupFailure> {
        let workdir = WorkingDirectory::acquire(config.path.as_deref()).map_err(|source| {
            SetupFailure::WorkingDirectory {
                path: config
                    .path
                    .clone()
                    .unwrap_or_else(std::env::temp_dir),
                source,
            }
        })?;
        self.reporter.report(&LifecycleEvent::WorkingDirectoryReady {
            path: workdir.path(),
            owned: workdir.is_owned(),
        });
        let workdir = acquired.workdir.insert(workdir);

        self.reporter.report(&LifecycleEvent::Cloning {
            url: &config.repo_url,
            path: workdir.path(),
        });
        self.fetcher
            .fetch(&config.repo_url, workdir.path())
            .await
            .map_err(|source| SetupFailure::Fetch {
                url: config.repo_url.clone(),
                source,
            })?;

        self.reporter.report(&LifecycleEvent::ConnectingEngine);
        let engine = self
            .connector
            .connect()
            .await
            .map_err(SetupFailure::EngineConnect)?;
        let engine = acquired.engine.insert(engine);

        self.reporter.report(&LifecycleEvent::Building {
            tag: &config.image_tag,
        });
        let build =
            BuildSpec::new(config.image_tag.clone()).with_dockerfile(config.dockerfile.clone());
        engine
            .build_image(workdir.path(), &build)
            .await
            .map_err(|source| SetupFailure::Build {
                tag: config.image_tag.clone(),
                source,
            })?;
        acquired.image_tag = Some(config.image_tag.clone());

        self.reporter.report(&LifecycleEvent::Starting {
            name: &config.container_name,
        });
        let spec = ContainerSpec::new(
            config.container_name.clone(),
            config.image_tag.clone(),
            config.container_port,
            config.host_port,
        );
        let container = engine
            .run_container(&spec)
            .await
            .map_err(|source| SetupFailure::Run {
                name: config.container_name.clone(),
                source,
            })?;
        self.reporter
            .report(&LifecycleEvent::ContainerRunning { container: &container });
        acquired.container = Some(container.clone());

        Ok((workdir.path().to_path_buf(), container))
    }

    async fn cleanup(&self, acquired: &Acquired) -> CleanupReport {
        acquired
            .cleanup_plan()
            .execute(acquired.engine.as_deref(), self.reporter.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, FetchError, SetupStep};
    use crate::lifecycle::cleanup::CleanupAction;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    type CallLog = Arc<Mutex<Vec<String>>>;

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().expect("lock poisoned").clone()
    }

    fn push(log: &CallLog, call: impl Into<String>) {
        log.lock().expect("lock poisoned").push(call.into());
    }

    /// Fetcher that writes a Dockerfile instead of cloning.
    struct MockFetcher {
        log: CallLog,
        fail: bool,
    }

    #[async_trait]
    impl SourceFetcher for MockFetcher {
        async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
            push(&self.log, format!("fetch {url} {}", destination.display()));
            if self.fail {
                return Err(FetchError::Exited {
                    code: 128,
                    stderr: "fatal: unable to access repository".to_string(),
                });
            }
            std::fs::write(destination.join("Dockerfile"), "FROM scratch\n")
                .map_err(FetchError::Spawn)?;
            Ok(())
        }
    }

    #[derive(Default, Clone, Copy)]
    struct Failures {
        connect: bool,
        build: bool,
        run: bool,
        stop: bool,
        remove: bool,
    }

    struct MockEngine {
        log: CallLog,
        failures: Failures,
    }

    #[async_trait]
    impl Engine for MockEngine {
        async fn build_image(&self, context_dir: &Path, spec: &BuildSpec) -> Result<(), EngineError> {
            push(&self.log, format!("build {} {}", spec.tag, context_dir.display()));
            if self.failures.build {
                return Err(EngineError::BuildFailed("syntax error in Dockerfile".to_string()));
            }
            Ok(())
        }

        async fn run_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle, EngineError> {
            push(
                &self.log,
                format!("run {} {} {}->{}", spec.name, spec.image, spec.container_port, spec.host_port),
            );
            if self.failures.run {
                return Err(EngineError::RunFailed("port is already allocated".to_string()));
            }
            Ok(ContainerHandle::new("container-id", spec))
        }

        async fn stop_container(&self, id: &str) -> Result<(), EngineError> {
            push(&self.log, format!("stop {id}"));
            if self.failures.stop {
                return Err(EngineError::StopFailed {
                    id: id.to_string(),
                    reason: "no such container".to_string(),
                });
            }
            Ok(())
        }

        async fn remove_image(&self, tag: &str) -> Result<(), EngineError> {
            push(&self.log, format!("remove {tag}"));
            if self.failures.remove {
                return Err(EngineError::RemoveFailed {
                    tag: tag.to_string(),
                    reason: "no such image".to_string(),
                });
            }
            Ok(())
        }
    }

    struct MockConnector {
        log: CallLog,
        failures: Failures,
    }

    #[async_trait]
    impl EngineConnector for MockConnector {
        async fn connect(&self) -> Result<Arc<dyn Engine>, EngineError> {
            push(&self.log, "connect");
            if self.failures.connect {
                return Err(EngineError::DaemonUnavailable("connection refused".to_string()));
            }
            Ok(Arc::new(MockEngine {
                log: self.log.clone(),
                failures: self.failures,
            }))
        }
    }

    struct ImmediateInterrupt {
        log: CallLog,
    }

    #[async_trait]
    impl Interrupt for ImmediateInterrupt {
        async fn wait(&self) {
            push(&self.log, "wait");
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        lines: Mutex<Vec<String>>,
        fatal: Mutex<Vec<String>>,
        workdir: Mutex<Option<PathBuf>>,
    }

    impl RecordingReporter {
        fn workdir(&self) -> PathBuf {
            self.workdir
                .lock()
                .expect("lock poisoned")
                .clone()
                .expect("working directory reported")
        }
    }

    impl Reporter for RecordingReporter {
        fn report(&self, event: &LifecycleEvent<'_>) {
            let line = match event {
                LifecycleEvent::WorkingDirectoryReady { path, .. } => {
                    *self.workdir.lock().expect("lock poisoned") = Some(path.to_path_buf());
                    format!("{event:?}")
                }
                LifecycleEvent::ContainerRunning { container } => {
                    format!("running {}", container.local_url())
                }
                LifecycleEvent::SetupFailed { failure } => {
                    self.fatal
                        .lock()
                        .expect("lock poisoned")
                        .push(failure.to_string());
                    "setup failed".to_string()
                }
                other => format!("{other:?}"),
            };
            self.lines.lock().expect("lock poisoned").push(line);
        }
    }

    struct Harness {
        log: CallLog,
        reporter: Arc<RecordingReporter>,
        orchestrator: Orchestrator,
    }

    fn harness(fetch_fails: bool, failures: Failures) -> Harness {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let reporter = Arc::new(RecordingReporter::default());
        let orchestrator = Orchestrator::new(
            Arc::new(MockFetcher {
                log: log.clone(),
                fail: fetch_fails,
            }),
            Arc::new(MockConnector {
                log: log.clone(),
                failures,
            }),
            Arc::new(ImmediateInterrupt { log: log.clone() }),
            reporter.clone(),
        );
        Harness {
            log,
            reporter,
            orchestrator,
        }
    }

    fn verbs(log: &CallLog) -> Vec<String> {
        calls(log)
            .into_iter()
            .map(|c| c.split_whitespace().next().unwrap_or_default().to_string())
            .collect()
    }

    fn config() -> RunConfig {
        RunConfig::new("https://example.com/app.git").with_ports(8080, 9191)
    }

    #[tokio::test]
    async fn test_full_run_with_generated_directory() {
        let h = harness(false, Failures::default());
        let config = config();

        let summary = h.orchestrator.run(&config).await.expect("run succeeds");

        assert_eq!(
            verbs(&h.log),
            vec!["fetch", "connect", "build", "run", "wait", "stop", "remove"]
        );
        assert!(!summary.working_directory.exists());
        assert_eq!(summary.host_port, 9191);
        assert_eq!(summary.image_tag, config.image_tag);
        assert_eq!(summary.container_name, config.container_name);
        assert_eq!(summary.cleanup.failures(), 0);
        assert_eq!(summary.cleanup.outcomes.len(), 3);

        let lines = h.reporter.lines.lock().expect("lock poisoned").clone();
        assert!(lines.contains(&"running http://127.0.0.1:9191".to_string()));
        assert!(h.reporter.fatal.lock().expect("lock poisoned").is_empty());
    }

    #[tokio::test]
    async fn test_hinted_directory_is_clone_destination_and_build_context() {
        let h = harness(false, Failures::default());
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config().with_path(dir.path());

        let summary = h.orchestrator.run(&config).await.expect("run succeeds");

        let log = calls(&h.log);
        let expected_fetch = format!("fetch https://example.com/app.git {}", dir.path().display());
        let expected_build = format!("build {} {}", config.image_tag, dir.path().display());
        assert_eq!(log[0], expected_fetch);
        assert_eq!(log[2], expected_build);
        assert_eq!(summary.working_directory, dir.path());
        // Caller-supplied directories survive cleanup.
        assert!(dir.path().join("Dockerfile").exists());
        assert!(!summary
            .cleanup
            .attempted()
            .iter()
            .any(|a| matches!(a, CleanupAction::RemoveDirectory { .. })));
    }

    #[tokio::test]
    async fn test_fetch_failure_stops_before_engine() {
        let h = harness(true, Failures::default());

        let failure = h.orchestrator.run(&config()).await.expect_err("fetch fails");

        assert_eq!(failure.step(), SetupStep::Fetch);
        assert_eq!(failure.exit_code(), 1);
        assert_eq!(verbs(&h.log), vec!["fetch"]);
        let fatal = h.reporter.fatal.lock().expect("lock poisoned").clone();
        assert_eq!(fatal.len(), 1);
        assert!(fatal[0].contains("unable to access repository"));

        let workdir = h.reporter.workdir();
        assert!(workdir.exists());
        std::fs::remove_dir_all(workdir).expect("cleanup");
    }

    #[tokio::test]
    async fn test_fetch_failure_rolls_back_owned_directory_when_enabled() {
        let h = harness(true, Failures::default());
        let config = config().with_cleanup_on_failure(true);

        let failure = h.orchestrator.run(&config).await.expect_err("fetch fails");

        assert_eq!(failure.step(), SetupStep::Fetch);
        // The engine was never reached, so only the directory is released.
        assert_eq!(verbs(&h.log), vec!["fetch"]);
        assert!(!h.reporter.workdir().exists());
        assert_eq!(h.reporter.fatal.lock().expect("lock poisoned").len(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_fatal() {
        let h = harness(
            false,
            Failures {
                connect: true,
                ..Default::default()
            },
        );

        let failure = h.orchestrator.run(&config()).await.expect_err("connect fails");

        assert_eq!(failure.step(), SetupStep::EngineConnect);
        assert_eq!(verbs(&h.log), vec!["fetch", "connect"]);
    }

    #[tokio::test]
    async fn test_build_failure_is_fatal_without_cleanup() {
        let h = harness(
            false,
            Failures {
                build: true,
                ..Default::default()
            },
        );

        let failure = h.orchestrator.run(&config()).await.expect_err("build fails");

        assert_eq!(failure.step(), SetupStep::Build);
        assert_eq!(verbs(&h.log), vec!["fetch", "connect", "build"]);
        assert_eq!(h.reporter.fatal.lock().expect("lock poisoned").len(), 1);
    }

    #[tokio::test]
    async fn test_run_failure_leaves_image_by_default() {
        let h = harness(
            false,
            Failures {
                run: true,
                ..Default::default()
            },
        );
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config().with_path(dir.path().join("checkout"));

        let failure = h.orchestrator.run(&config).await.expect_err("run fails");

        assert_eq!(failure.step(), SetupStep::Run);
        assert!(failure.to_string().contains("port is already allocated"));
        assert_eq!(verbs(&h.log), vec!["fetch", "connect", "build", "run"]);
        assert!(dir.path().join("checkout").exists());
    }

    #[tokio::test]
    async fn test_run_failure_rolls_back_when_enabled() {
        let h = harness(
            false,
            Failures {
                run: true,
                ..Default::default()
            },
        );
        let config = config().with_cleanup_on_failure(true);

        let failure = h.orchestrator.run(&config).await.expect_err("run fails");

        assert_eq!(failure.step(), SetupStep::Run);
        // No container was acquired, so nothing is stopped.
        assert_eq!(
            verbs(&h.log),
            vec!["fetch", "connect", "build", "run", "remove"]
        );
        assert!(!h.reporter.workdir().exists());
        assert_eq!(h.reporter.fatal.lock().expect("lock poisoned").len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_continues_after_failures() {
        let h = harness(
            false,
            Failures {
                stop: true,
                remove: true,
                ..Default::default()
            },
        );

        let summary = h.orchestrator.run(&config()).await.expect("cleanup errors are suppressed");

        assert_eq!(
            verbs(&h.log),
            vec!["fetch", "connect", "build", "run", "wait", "stop", "remove"]
        );
        assert_eq!(summary.cleanup.failures(), 2);
        assert!(summary.cleanup.outcomes[2].succeeded());
        assert!(!summary.working_directory.exists());
        assert!(h.reporter.fatal.lock().expect("lock poisoned").is_empty());
    }

    #[tokio::test]
    async fn test_repeated_cleanup_is_harmless() {
        let h = harness(false, Failures::default());
        let config = config();
        let summary = h.orchestrator.run(&config).await.expect("run succeeds");

        let engine = MockEngine {
            log: h.log.clone(),
            failures: Failures {
                stop: true,
                remove: true,
                ..Default::default()
            },
        };
        let container = ContainerHandle::new(
            summary.container_id.clone(),
            &ContainerSpec::new(&summary.container_name, &summary.image_tag, 8080, 9191),
        );
        let workdir = WorkingDirectory::acquire(None).expect("acquire");
        std::fs::remove_dir_all(workdir.path()).expect("remove");

        let plan = CleanupPlan::new(Some(&container), Some(&summary.image_tag), Some(&workdir));
        let report = plan.execute(Some(&engine as &dyn Engine), h.reporter.as_ref()).await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.failures(), 3);
        assert!(h.reporter.fatal.lock().expect("lock poisoned").is_empty());
    }
}
