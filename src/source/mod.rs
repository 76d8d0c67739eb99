//! Source fetching: getting a remote repository onto local disk.

mod git;

use std::path::Path;

use async_trait::async_trait;

use crate::error::FetchError;

pub use git::GitCli;

/// Clones a remote repository into a local directory.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Clones `url` into `destination`. The destination may already exist but must be empty.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError>;
}
