//! One full sync pass: discover desired projects, then reconcile

use crate::discovery::discover_projects;
use crate::error::{SyncError, SyncResult};
use crate::reconciler::{Reconciler, SyncReport};
use crate::repository::RepositoryConnector;
use crate::scheduler::JobScheduler;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a completed pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of projects found in the repository
    pub discovered: usize,
    #[serde(flatten)]
    pub report: SyncReport,
}

/// Wires the repository, record store and scheduling service together
pub struct SyncService {
    storage: Arc<dyn Storage>,
    connector: Arc<dyn RepositoryConnector>,
    scheduler: Arc<dyn JobScheduler>,
    projects_dir: String,
}

impl SyncService {
    pub fn new(
        storage: Arc<dyn Storage>,
        connector: Arc<dyn RepositoryConnector>,
        scheduler: Arc<dyn JobScheduler>,
        projects_dir: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            connector,
            scheduler,
            projects_dir: projects_dir.into(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Run a single pass
    ///
    /// Fails before touching the repository or the scheduling service when
    /// no access token is stored, or when the repository cannot be read.
    pub async fn run_once(&self) -> SyncResult<SyncOutcome> {
        let started_at = Utc::now();

        let token = self
            .storage
            .get_access_token()
            .await?
            .ok_or(SyncError::MissingAccessToken)?;

        let repository = self.connector.connect(&token).await?;
        let desired = discover_projects(repository.as_ref(), &self.projects_dir).await?;

        let reconciler = Reconciler::new(Arc::new(self.storage.clone()), self.scheduler.clone());
        let report = reconciler.reconcile(&desired).await?;

        Ok(SyncOutcome {
            started_at,
            finished_at: Utc::now(),
            discovered: desired.len(),
            report,
        })
    }
}
