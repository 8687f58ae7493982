//! In-memory scheduling service

use super::{BUILD_REQUEST_TOPIC, JobOperation, JobScheduler};
use crate::error::{SchedulerError, SchedulerResult};
use crate::project::job_id;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// A job held by [`InMemoryScheduler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub id: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub schedule: String,
}

/// A call received by [`InMemoryScheduler`], failed or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerCall {
    pub operation: JobOperation,
    pub project: String,
}

#[derive(Debug, Default)]
struct State {
    jobs: BTreeMap<String, ScheduledJob>,
    calls: Vec<SchedulerCall>,
    failures: HashSet<(JobOperation, String)>,
}

/// Scheduling service kept in memory, with failure injection
///
/// Behaves like the real service: creating an existing job and touching a
/// missing one are errors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduler {
    state: Arc<Mutex<State>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing job
    pub async fn insert_job(&self, project_name: &str, schedule: &str) {
        let mut state = self.state.lock().await;
        state
            .jobs
            .insert(job_id(project_name), new_job(project_name, schedule));
    }

    /// Make every `operation` on `project_name` fail until cleared
    pub async fn fail_on(&self, operation: JobOperation, project_name: &str) {
        let mut state = self.state.lock().await;
        state.failures.insert((operation, project_name.to_string()));
    }

    /// Remove all injected failures
    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Jobs keyed by job id
    pub async fn jobs(&self) -> BTreeMap<String, ScheduledJob> {
        self.state.lock().await.jobs.clone()
    }

    /// Every call received so far, in order
    pub async fn calls(&self) -> Vec<SchedulerCall> {
        self.state.lock().await.calls.clone()
    }

    /// Forget recorded calls
    pub async fn reset_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Record the call and apply injected failures
    async fn begin(
        &self,
        operation: JobOperation,
        project_name: &str,
    ) -> SchedulerResult<MutexGuard<'_, State>> {
        let mut state = self.state.lock().await;
        state.calls.push(SchedulerCall {
            operation,
            project: project_name.to_string(),
        });
        if state
            .failures
            .contains(&(operation, project_name.to_string()))
        {
            return Err(SchedulerError::Call(format!(
                "injected {operation} failure for {project_name}"
            )));
        }
        Ok(state)
    }
}

fn new_job(project_name: &str, schedule: &str) -> ScheduledJob {
    ScheduledJob {
        id: job_id(project_name),
        topic: BUILD_REQUEST_TOPIC.to_string(),
        payload: project_name.as_bytes().to_vec(),
        schedule: schedule.to_string(),
    }
}

#[async_trait]
impl JobScheduler for InMemoryScheduler {
    async fn create_job(&self, project_name: &str, schedule: &str) -> SchedulerResult<()> {
        let mut state = self.begin(JobOperation::Create, project_name).await?;
        let id = job_id(project_name);
        if state.jobs.contains_key(&id) {
            return Err(SchedulerError::AlreadyExists(id));
        }
        state.jobs.insert(id, new_job(project_name, schedule));
        Ok(())
    }

    async fn update_job(&self, project_name: &str, schedule: &str) -> SchedulerResult<()> {
        let mut state = self.begin(JobOperation::Update, project_name).await?;
        let id = job_id(project_name);
        match state.jobs.get_mut(&id) {
            Some(job) => {
                job.schedule = schedule.to_string();
                Ok(())
            }
            None => Err(SchedulerError::NotFound(id)),
        }
    }

    async fn delete_job(&self, project_name: &str) -> SchedulerResult<()> {
        let mut state = self.begin(JobOperation::Delete, project_name).await?;
        let id = job_id(project_name);
        match state.jobs.remove(&id) {
            Some(_) => Ok(()),
            None => Err(SchedulerError::NotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let scheduler = InMemoryScheduler::new();

        scheduler.create_job("libpng", "0 6 * * *").await.unwrap();
        let jobs = scheduler.jobs().await;
        let job = &jobs["libpng-scheduler"];
        assert_eq!(job.topic, "request-build");
        assert_eq!(job.payload, b"libpng");
        assert_eq!(job.schedule, "0 6 * * *");

        assert!(matches!(
            scheduler.create_job("libpng", "0 6 * * *").await,
            Err(SchedulerError::AlreadyExists(_))
        ));

        scheduler.update_job("libpng", "0 6,18 * * *").await.unwrap();
        assert_eq!(scheduler.jobs().await["libpng-scheduler"].schedule, "0 6,18 * * *");

        scheduler.delete_job("libpng").await.unwrap();
        assert!(scheduler.jobs().await.is_empty());
        assert!(matches!(
            scheduler.delete_job("libpng").await,
            Err(SchedulerError::NotFound(_))
        ));
        assert_eq!(scheduler.calls().await.len(), 5);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let scheduler = InMemoryScheduler::new();
        scheduler.insert_job("curl", "0 6 * * *").await;
        scheduler.fail_on(JobOperation::Delete, "curl").await;

        assert!(matches!(
            scheduler.delete_job("curl").await,
            Err(SchedulerError::Call(_))
        ));
        assert!(scheduler.jobs().await.contains_key("curl-scheduler"));

        scheduler.clear_failures().await;
        scheduler.delete_job("curl").await.unwrap();
        assert!(scheduler.jobs().await.is_empty());
    }
}
