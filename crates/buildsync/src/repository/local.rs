//! Repository checkout on the local filesystem

use super::{EntryKind, RepoEntry, RepositoryBrowser, RepositoryConnector, join_path};
use crate::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Browses a working tree rooted at `root`
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_matches('/'))
    }
}

fn map_io(path: &str, error: std::io::Error) -> RepositoryError {
    if error.kind() == ErrorKind::NotFound {
        RepositoryError::NotFound(path.to_string())
    } else {
        RepositoryError::Io(error)
    }
}

#[async_trait]
impl RepositoryBrowser for LocalRepository {
    async fn list_directory(&self, path: &str) -> RepositoryResult<Vec<RepoEntry>> {
        let dir = self.resolve(path);
        let metadata = tokio::fs::metadata(&dir).await.map_err(|e| map_io(path, e))?;
        if !metadata.is_dir() {
            return Err(RepositoryError::UnexpectedKind {
                path: path.to_string(),
                expected: "dir",
            });
        }

        let mut reader = tokio::fs::read_dir(&dir).await.map_err(|e| map_io(path, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let file_type = entry.file_type().await?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(RepoEntry {
                path: join_path(path, &name),
                name,
                kind,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> RepositoryResult<Vec<u8>> {
        let file = self.resolve(path);
        let metadata = tokio::fs::metadata(&file).await.map_err(|e| map_io(path, e))?;
        if metadata.is_dir() {
            return Err(RepositoryError::UnexpectedKind {
                path: path.to_string(),
                expected: "file",
            });
        }

        tokio::fs::read(&file).await.map_err(|e| map_io(path, e))
    }
}

/// A local checkout needs no credentials; the token is ignored
#[async_trait]
impl RepositoryConnector for LocalRepository {
    async fn connect(&self, _access_token: &str) -> RepositoryResult<Box<dyn RepositoryBrowser>> {
        Ok(Box::new(self.clone()))
    }
}
