//! Working directory acquisition.

use std::path::{Path, PathBuf};

const TEMP_PREFIX: &str = "repo-runner-";

/// Directory holding the checkout and serving as the build context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    path: PathBuf,
    owned: bool,
}

impl WorkingDirectory {
    /// Resolves the working directory for a run.
    ///
    /// Without a hint a fresh temporary directory is created and owned by the
    /// run. With a hint the directory is created if missing and left in place
    /// after cleanup.
    pub fn acquire(hint: Option<&Path>) -> std::io::Result<Self> {
        match hint {
            Some(path) => {
                std::fs::create_dir_all(path)?;
                Ok(Self {
                    path: path.to_path_buf(),
                    owned: false,
                })
            }
            None => {
                let dir = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir()?;
                Ok(Self {
                    path: dir.keep(),
                    owned: true,
                })
            }
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory was generated by the run and may be deleted.
    pub fn is_owned(&self) -> bool {
        self.owned
    }
}
