//! In-memory storage implementation

use super::traits::*;
use crate::error::StorageResult;
use crate::project::ProjectRecord;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage for development and testing
///
/// Projects are kept ordered by name so listings are deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    projects: Arc<RwLock<BTreeMap<String, ProjectRecord>>>,
    access_token: Arc<RwLock<Option<String>>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records
    pub fn with_projects(projects: impl IntoIterator<Item = ProjectRecord>) -> Self {
        let projects = projects
            .into_iter()
            .map(|project| (project.name.clone(), project))
            .collect();
        Self {
            projects: Arc::new(RwLock::new(projects)),
            ..Self::default()
        }
    }

    /// Snapshot of stored schedules keyed by project name
    pub async fn schedules(&self) -> BTreeMap<String, String> {
        self.projects
            .read()
            .await
            .values()
            .map(|p| (p.name.clone(), p.schedule.clone()))
            .collect()
    }
}

#[async_trait]
impl ProjectStorage for InMemoryStorage {
    async fn get_project(&self, name: &str) -> StorageResult<Option<ProjectRecord>> {
        let projects = self.projects.read().await;
        Ok(projects.get(name).cloned())
    }

    async fn list_projects(&self) -> StorageResult<Vec<ProjectRecord>> {
        let projects = self.projects.read().await;
        Ok(projects.values().cloned().collect())
    }

    async fn upsert_project(&self, project: ProjectRecord) -> StorageResult<()> {
        let mut projects = self.projects.write().await;
        projects.insert(project.name.clone(), project);
        Ok(())
    }

    async fn delete_project(&self, name: &str) -> StorageResult<bool> {
        let mut projects = self.projects.write().await;
        Ok(projects.remove(name).is_some())
    }
}

#[async_trait]
impl SecretStorage for InMemoryStorage {
    async fn get_access_token(&self) -> StorageResult<Option<String>> {
        Ok(self.access_token.read().await.clone())
    }

    async fn set_access_token(&self, token: &str) -> StorageResult<()> {
        *self.access_token.write().await = Some(token.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_project_crud() {
        let storage = InMemoryStorage::new();

        // Create
        storage
            .upsert_project(ProjectRecord::new("libpng", "0 6 * * *"))
            .await
            .unwrap();

        // Read
        let retrieved = storage.get_project("libpng").await.unwrap();
        assert_eq!(retrieved.unwrap().schedule, "0 6 * * *");

        // Update
        storage
            .upsert_project(ProjectRecord::new("libpng", "0 6,18 * * *"))
            .await
            .unwrap();
        let projects = storage.list_projects().await.unwrap();
        assert_eq!(projects, vec![ProjectRecord::new("libpng", "0 6,18 * * *")]);

        // Delete
        assert!(storage.delete_project("libpng").await.unwrap());
        assert!(!storage.delete_project("libpng").await.unwrap());
        assert!(storage.get_project("libpng").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_is_ordered() {
        let storage = InMemoryStorage::with_projects([
            ProjectRecord::new("zlib", "0 6 * * *"),
            ProjectRecord::new("curl", "0 6 * * *"),
            ProjectRecord::new("libxml2", "0 6 * * *"),
        ]);

        let names: Vec<_> = storage
            .list_projects()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["curl", "libxml2", "zlib"]);
    }

    #[tokio::test]
    async fn test_access_token() {
        let storage = InMemoryStorage::new();
        assert!(storage.get_access_token().await.unwrap().is_none());

        storage.set_access_token("ghp_test").await.unwrap();
        assert_eq!(
            storage.get_access_token().await.unwrap().as_deref(),
            Some("ghp_test")
        );
    }
}
