//! Scheduling service access
//!
//! Each project owns one job, identified by `<project>-scheduler`, which
//! publishes the project name to the build request topic on the project's
//! cron schedule.

mod cloud;
mod memory;

pub use cloud::{CloudSchedulerClient, CloudSchedulerConfig};
pub use memory::{InMemoryScheduler, ScheduledJob, SchedulerCall};

use crate::error::SchedulerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic build requests are published to
pub const BUILD_REQUEST_TOPIC: &str = "request-build";

/// Operation against the scheduling service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for JobOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOperation::Create => write!(f, "create"),
            JobOperation::Update => write!(f, "update"),
            JobOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Scheduling service capability
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Create the job for a project
    async fn create_job(&self, project_name: &str, schedule: &str) -> SchedulerResult<()>;

    /// Change the schedule of an existing job
    async fn update_job(&self, project_name: &str, schedule: &str) -> SchedulerResult<()>;

    /// Delete the job for a project
    async fn delete_job(&self, project_name: &str) -> SchedulerResult<()>;
}
