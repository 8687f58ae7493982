//! Read-only access to the source repository
//!
//! Discovery only needs two capabilities: listing a directory and reading a
//! file. Backends:
//! - [`GitHubRepository`]: GitHub contents API
//! - [`LocalRepository`]: a checkout on disk
//! - [`InMemoryRepository`]: fixed tree for tests and dry runs

mod github;
mod local;
mod memory;

pub use github::{GitHubConfig, GitHubConnector, GitHubRepository};
pub use local::LocalRepository;
pub use memory::InMemoryRepository;

use crate::error::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, submodules and anything else discovery ignores
    #[serde(other)]
    Other,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    /// Base name
    pub name: String,

    /// Path relative to the repository root
    pub path: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl RepoEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Repository browsing capability
#[async_trait]
pub trait RepositoryBrowser: Send + Sync {
    /// List the immediate children of a directory
    async fn list_directory(&self, path: &str) -> RepositoryResult<Vec<RepoEntry>>;

    /// Read the raw bytes of a file
    async fn read_file(&self, path: &str) -> RepositoryResult<Vec<u8>>;
}

/// Opens a repository browser with the given access token
#[async_trait]
pub trait RepositoryConnector: Send + Sync {
    async fn connect(&self, access_token: &str) -> RepositoryResult<Box<dyn RepositoryBrowser>>;
}

/// Join a directory path and an entry name
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_deserialization() {
        let entries: Vec<RepoEntry> = serde_json::from_str(
            r#"[
                {"name": "a", "path": "projects/a", "type": "dir"},
                {"name": "b", "path": "projects/b", "type": "file"},
                {"name": "c", "path": "projects/c", "type": "submodule"}
            ]"#,
        )
        .unwrap();

        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[2].kind, EntryKind::Other);
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("projects", "a"), "projects/a");
        assert_eq!(join_path("projects/", "a"), "projects/a");
        assert_eq!(join_path("", "a"), "a");
    }
}
