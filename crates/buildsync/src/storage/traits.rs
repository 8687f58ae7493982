//! Storage trait definitions

use crate::error::StorageResult;
use crate::project::ProjectRecord;
use async_trait::async_trait;

/// Combined storage trait
pub trait Storage: ProjectStorage + SecretStorage + Send + Sync {}

impl<T> Storage for T where T: ProjectStorage + SecretStorage + Send + Sync {}

/// Storage for project records
#[async_trait]
pub trait ProjectStorage: Send + Sync {
    /// Get a project by name
    async fn get_project(&self, name: &str) -> StorageResult<Option<ProjectRecord>>;

    /// List all projects
    async fn list_projects(&self) -> StorageResult<Vec<ProjectRecord>>;

    /// Create or update a project
    async fn upsert_project(&self, project: ProjectRecord) -> StorageResult<()>;

    /// Delete a project by name
    async fn delete_project(&self, name: &str) -> StorageResult<bool>;
}

/// Storage for the repository access token
#[async_trait]
pub trait SecretStorage: Send + Sync {
    /// The stored access token, if any
    async fn get_access_token(&self) -> StorageResult<Option<String>>;

    /// Replace the stored access token
    async fn set_access_token(&self, token: &str) -> StorageResult<()>;
}

#[async_trait]
impl<T: ProjectStorage + ?Sized> ProjectStorage for std::sync::Arc<T> {
    async fn get_project(&self, name: &str) -> StorageResult<Option<ProjectRecord>> {
        (**self).get_project(name).await
    }

    async fn list_projects(&self) -> StorageResult<Vec<ProjectRecord>> {
        (**self).list_projects().await
    }

    async fn upsert_project(&self, project: ProjectRecord) -> StorageResult<()> {
        (**self).upsert_project(project).await
    }

    async fn delete_project(&self, name: &str) -> StorageResult<bool> {
        (**self).delete_project(name).await
    }
}
