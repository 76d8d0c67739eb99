//! Configuration for a single repo-runner run.

use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

/// Repository cloned when no `--repo_url` is given.
pub const DEFAULT_REPO_URL: &str = "git@github.com:guyyosan/python-cherry-container.git";

/// Port the containerised service listens on by default.
pub const DEFAULT_CONTAINER_PORT: u16 = 8080;

/// Host port mapped to the container port by default.
pub const DEFAULT_HOST_PORT: u16 = 9090;

/// Build descriptor looked up in the repository root by default.
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

const IMAGE_TAG_PREFIX: &str = "repo-runner-image";
const CONTAINER_NAME_PREFIX: &str = "repo-runner-container";

/// Configuration for one clone/build/run/cleanup cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Identifier of this run; seeds the default image tag and container name.
    pub run_id: Uuid,
    /// Remote repository to clone.
    pub repo_url: String,
    /// Branch or tag to check out instead of the remote HEAD.
    pub branch: Option<String>,
    /// Shallow clone depth.
    pub depth: Option<u32>,
    /// Caller-supplied working directory. A temporary one is generated when absent.
    pub path: Option<PathBuf>,
    /// Port the process inside the container listens on.
    pub container_port: u16,
    /// Host port mapped to `container_port`.
    pub host_port: u16,
    /// Dockerfile path relative to the repository root.
    pub dockerfile: String,
    /// Tag given to the built image.
    pub image_tag: String,
    /// Name given to the running container.
    pub container_name: String,
    /// Release already-acquired resources when a setup step fails.
    pub cleanup_on_failure: bool,
}

impl RunConfig {
    /// Creates a configuration for the given repository with a fresh run id.
    pub fn new(repo_url: impl Into<String>) -> Self {
        let run_id = Uuid::new_v4();
        let short = short_id(&run_id);

        Self {
            run_id,
            repo_url: repo_url.into(),
            branch: None,
            depth: None,
            path: None,
            container_port: DEFAULT_CONTAINER_PORT,
            host_port: DEFAULT_HOST_PORT,
            dockerfile: DEFAULT_DOCKERFILE.to_string(),
            image_tag: format!("{IMAGE_TAG_PREFIX}-{short}"),
            container_name: format!("{CONTAINER_NAME_PREFIX}-{short}"),
            cleanup_on_failure: false,
        }
    }

    /// Sets the working directory hint.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the container and host ports.
    pub fn with_ports(mut self, container_port: u16, host_port: u16) -> Self {
        self.container_port = container_port;
        self.host_port = host_port;
        self
    }

    /// Sets the branch or tag to clone.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Sets the shallow clone depth.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Sets the Dockerfile path.
    pub fn with_dockerfile(mut self, dockerfile: impl Into<String>) -> Self {
        self.dockerfile = dockerfile.into();
        self
    }

    /// Overrides the run-scoped image tag.
    pub fn with_image_tag(mut self, tag: impl Into<String>) -> Self {
        self.image_tag = tag.into();
        self
    }

    /// Overrides the run-scoped container name.
    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = name.into();
        self
    }

    /// Enables rollback of acquired resources on setup failure.
    pub fn with_cleanup_on_failure(mut self, enabled: bool) -> Self {
        self.cleanup_on_failure = enabled;
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REPO_URL)
    }
}

fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
