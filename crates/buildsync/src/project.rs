//! Project records and desired state

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static VALID_PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("project name pattern compiles"));

/// Suffix appended to a project name to form its scheduler job id
pub const JOB_SUFFIX: &str = "-scheduler";

/// Desired state: project name to cron schedule, ordered by name
pub type DesiredProjects = BTreeMap<String, String>;

/// Whether `name` is an acceptable project directory name
pub fn is_valid_project_name(name: &str) -> bool {
    VALID_PROJECT_NAME.is_match(name)
}

/// Scheduler job id for a project
pub fn job_id(project_name: &str) -> String {
    format!("{project_name}{JOB_SUFFIX}")
}

/// Persisted record of a project with a scheduled build job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project name, unique key
    pub name: String,

    /// Cron expression the job runs on
    pub schedule: String,
}

impl ProjectRecord {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_names() {
        for name in ["test0", "libpng", "open_ssl", "boring-ssl", "A9"] {
            assert!(is_valid_project_name(name), "{name} should be valid");
        }
        for name in ["test1@", "", "a b", "a/b", "..", "proj.yaml", "naïve"] {
            assert!(!is_valid_project_name(name), "{name} should be invalid");
        }
    }

    #[test]
    fn test_job_id() {
        assert_eq!(job_id("libpng"), "libpng-scheduler");
    }
}
