//! Reconciliation of project records against the desired state
//!
//! A pass runs three phases, always in this order:
//! 1. delete jobs and records of projects that are no longer desired
//! 2. create jobs and records for new projects
//! 3. update jobs and records whose schedule changed
//!
//! Deleting first means a project removed and re-added under the same name
//! in one pass never has two jobs at once. A record is only written after
//! its job operation succeeded, so a failed project keeps its old record and
//! the next pass retries it. Failures are collected per project and never
//! stop the pass.

use crate::error::{SchedulerError, StorageResult};
use crate::project::{DesiredProjects, ProjectRecord};
use crate::scheduler::{JobOperation, JobScheduler};
use crate::storage::ProjectStorage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;

/// A project whose job or record could not be brought in line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub project: String,
    pub operation: JobOperation,
    pub error: String,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub deleted: Vec<String>,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// True when every attempted operation succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when nothing needed to change
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty()
            && self.created.is_empty()
            && self.updated.is_empty()
            && self.failures.is_empty()
    }

    fn fail(&mut self, project: &str, operation: JobOperation, error: impl Display) {
        self.failures.push(SyncFailure {
            project: project.to_string(),
            operation,
            error: error.to_string(),
        });
    }
}

/// Drives the scheduling service and the record store towards the desired state
pub struct Reconciler {
    storage: Arc<dyn ProjectStorage>,
    scheduler: Arc<dyn JobScheduler>,
}

impl Reconciler {
    pub fn new(storage: Arc<dyn ProjectStorage>, scheduler: Arc<dyn JobScheduler>) -> Self {
        Self { storage, scheduler }
    }

    /// Run one pass against `desired`
    ///
    /// Only a failure to list the stored records ends the pass early.
    pub async fn reconcile(&self, desired: &DesiredProjects) -> StorageResult<SyncReport> {
        let mut report = SyncReport::default();

        for project in self.storage.list_projects().await? {
            if !desired.contains_key(&project.name) {
                self.remove_project(&project.name, &mut report).await;
            }
        }

        let existing: HashSet<String> = self
            .storage
            .list_projects()
            .await?
            .into_iter()
            .map(|project| project.name)
            .collect();
        for (name, schedule) in desired {
            if !existing.contains(name) {
                self.add_project(name, schedule, &mut report).await;
            }
        }

        for project in self.storage.list_projects().await? {
            match desired.get(&project.name) {
                Some(schedule) if *schedule != project.schedule => {
                    self.reschedule_project(&project.name, schedule, &mut report)
                        .await;
                }
                _ => {}
            }
        }

        tracing::info!(
            deleted = report.deleted.len(),
            created = report.created.len(),
            updated = report.updated.len(),
            failed = report.failures.len(),
            "Reconciliation complete"
        );

        Ok(report)
    }

    async fn remove_project(&self, name: &str, report: &mut SyncReport) {
        match self.scheduler.delete_job(name).await {
            Ok(()) => {}
            Err(SchedulerError::NotFound(job)) => {
                tracing::warn!(project = %name, job = %job, "Scheduler job already gone");
            }
            Err(e) => {
                tracing::error!(project = %name, error = %e, "Scheduler deletion failed");
                report.fail(name, JobOperation::Delete, e);
                return;
            }
        }

        match self.storage.delete_project(name).await {
            Ok(_) => {
                tracing::info!(project = %name, "Deleted project");
                report.deleted.push(name.to_string());
            }
            Err(e) => {
                tracing::error!(project = %name, error = %e, "Deleting project record failed");
                report.fail(name, JobOperation::Delete, e);
            }
        }
    }

    async fn add_project(&self, name: &str, schedule: &str, report: &mut SyncReport) {
        let created = match self.scheduler.create_job(name, schedule).await {
            Err(SchedulerError::AlreadyExists(job)) => {
                // Left behind by a pass whose record write failed
                tracing::warn!(project = %name, job = %job, "Adopting existing scheduler job");
                self.scheduler.update_job(name, schedule).await
            }
            other => other,
        };
        if let Err(e) = created {
            tracing::error!(project = %name, error = %e, "Scheduler creation failed");
            report.fail(name, JobOperation::Create, e);
            return;
        }

        match self
            .storage
            .upsert_project(ProjectRecord::new(name, schedule))
            .await
        {
            Ok(()) => {
                tracing::info!(project = %name, schedule = %schedule, "Created project");
                report.created.push(name.to_string());
            }
            Err(e) => {
                tracing::error!(project = %name, error = %e, "Storing project record failed");
                report.fail(name, JobOperation::Create, e);
            }
        }
    }

    async fn reschedule_project(&self, name: &str, schedule: &str, report: &mut SyncReport) {
        if let Err(e) = self.scheduler.update_job(name, schedule).await {
            tracing::error!(project = %name, error = %e, "Updating scheduler failed");
            report.fail(name, JobOperation::Update, e);
            return;
        }

        match self
            .storage
            .upsert_project(ProjectRecord::new(name, schedule))
            .await
        {
            Ok(()) => {
                tracing::info!(project = %name, schedule = %schedule, "Updated project schedule");
                report.updated.push(name.to_string());
            }
            Err(e) => {
                tracing::error!(project = %name, error = %e, "Updating project record failed");
                report.fail(name, JobOperation::Update, e);
            }
        }
    }
}
