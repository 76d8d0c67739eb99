//! `git` command-line backed source fetcher.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use super::SourceFetcher;
use crate::error::FetchError;

/// Clones repositories by invoking the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    branch: Option<String>,
    depth: Option<u32>,
}

impl GitCli {
    /// Creates a fetcher using `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
            branch: None,
            depth: None,
        }
    }

    /// Uses a specific git executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Clones the given branch or tag.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Performs a shallow clone with the given depth.
    pub fn with_depth(mut self, depth: Option<u32>) -> Self {
        self.depth = depth;
        self
    }

    fn clone_args(&self, url: &str, destination: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["clone".into()];
        if let Some(branch) = &self.branch {
            args.push("--branch".into());
            args.push(branch.into());
        }
        if let Some(depth) = self.depth {
            args.push("--depth".into());
            args.push(depth.to_string().into());
        }
        args.push("--".into());
        args.push(url.into());
        args.push(destination.as_os_str().to_owned());
        args
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceFetcher for GitCli {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let output = tokio::process::Command::new(&self.program)
            .args(self.clone_args(url, destination))
            // Fail on missing credentials instead of waiting for a prompt.
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(FetchError::Spawn)?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match output.status.code() {
            Some(code) => Err(FetchError::Exited { code, stderr }),
            None => Err(FetchError::Terminated { stderr }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_args_plain() {
        let git = GitCli::new();
        let args = git.clone_args("https://example.com/repo.git", Path::new("/tmp/dest"));

        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["clone", "--", "https://example.com/repo.git", "/tmp/dest"]
        );
    }

    #[test]
    fn test_clone_args_branch_and_depth() {
        let git = GitCli::new()
            .with_branch(Some("release".to_string()))
            .with_depth(Some(1));
        let args: Vec<String> = git
            .clone_args("https://example.com/repo.git", Path::new("/tmp/dest"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "clone",
                "--branch",
                "release",
                "--depth",
                "1",
                "--",
                "https://example.com/repo.git",
                "/tmp/dest"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_git_binary_is_spawn_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let git = GitCli::new().with_program(dir.path().join("no-such-git"));

        let result = git
            .fetch("https://example.com/repo.git", &dir.path().join("dest"))
            .await;

        assert!(matches!(result, Err(FetchError::Spawn(_))));
    }
}
