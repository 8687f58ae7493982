//! In-memory repository tree

use super::{EntryKind, RepoEntry, RepositoryBrowser, RepositoryConnector};
use crate::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// Fixed repository tree for tests and dry runs
///
/// Paths use `/` separators and have no leading slash. Adding a file or
/// directory creates its missing parents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    nodes: BTreeMap<String, Node>,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory
    pub fn with_dir(mut self, path: &str) -> Self {
        self.insert_parents(path);
        self.nodes.insert(path.to_string(), Node::Dir);
        self
    }

    /// Add a file with the given contents
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert_parents(path);
        self.nodes.insert(path.to_string(), Node::File(contents.into()));
        self
    }

    /// Access tokens this repository was connected with, oldest first
    pub fn connected_tokens(&self) -> Vec<String> {
        self.tokens.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn insert_parents(&mut self, path: &str) {
        let mut parent = parent_of(path);
        while let Some(dir) = parent {
            self.nodes.entry(dir.to_string()).or_insert(Node::Dir);
            parent = parent_of(dir);
        }
    }
}

fn parent_of(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

#[async_trait]
impl RepositoryBrowser for InMemoryRepository {
    async fn list_directory(&self, path: &str) -> RepositoryResult<Vec<RepoEntry>> {
        match self.nodes.get(path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(RepositoryError::UnexpectedKind {
                    path: path.to_string(),
                    expected: "dir",
                });
            }
            None => return Err(RepositoryError::NotFound(path.to_string())),
        }

        Ok(self
            .nodes
            .iter()
            .filter(|(child, _)| parent_of(child) == Some(path))
            .map(|(child, node)| RepoEntry {
                name: child.rsplit('/').next().unwrap_or(child).to_string(),
                path: child.clone(),
                kind: match node {
                    Node::Dir => EntryKind::Dir,
                    Node::File(_) => EntryKind::File,
                },
            })
            .collect())
    }

    async fn read_file(&self, path: &str) -> RepositoryResult<Vec<u8>> {
        match self.nodes.get(path) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            Some(Node::Dir) => Err(RepositoryError::UnexpectedKind {
                path: path.to_string(),
                expected: "file",
            }),
            None => Err(RepositoryError::NotFound(path.to_string())),
        }
    }
}

#[async_trait]
impl RepositoryConnector for InMemoryRepository {
    async fn connect(&self, access_token: &str) -> RepositoryResult<Box<dyn RepositoryBrowser>> {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.push(access_token.to_string());
        }
        Ok(Box::new(self.clone()))
    }
}
