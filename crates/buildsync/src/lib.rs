//! # buildsync
//!
//! Keeps one scheduled build job per project in line with the projects
//! declared in a source repository.
//!
//! A project is a directory under `projects/` holding a `Dockerfile`. Its
//! optional `project.yaml` may set `schedule`, the number of builds per day
//! (1 to 4). Each pass lists the repository, derives a cron schedule for
//! every project and then creates, updates or deletes jobs on the scheduling
//! service so they match. A record store remembers what was scheduled, so a
//! pass only touches jobs that actually changed.
//!
//! ```text
//! repository ──► discovery ──► desired state ──► reconciler ──► scheduler
//!                                                     │
//!                                                     ▼
//!                                               record store
//! ```

#![deny(unsafe_code)]

pub mod discovery;
pub mod error;
pub mod project;
pub mod reconciler;
pub mod repository;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod sync;

pub use discovery::{PROJECTS_DIR, discover_projects};
pub use error::{
    ProjectYamlError, RepositoryError, ScheduleError, SchedulerError, StorageError, SyncError,
    SyncResult,
};
pub use project::{DesiredProjects, ProjectRecord};
pub use reconciler::{Reconciler, SyncFailure, SyncReport};
pub use schedule::{BuildsPerDay, cron_schedule};
pub use sync::{SyncOutcome, SyncService};
