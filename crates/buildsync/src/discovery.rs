//! Project discovery
//!
//! Builds the desired state from the repository: every valid directory under
//! the projects root that contains a `Dockerfile` becomes a project, with a
//! schedule derived from the optional `schedule` key of its `project.yaml`.

use crate::error::{ProjectYamlError, RepositoryError, RepositoryResult};
use crate::project::{DesiredProjects, is_valid_project_name};
use crate::repository::RepositoryBrowser;
use crate::schedule::BuildsPerDay;
use serde_yaml::Value;

/// Default directory holding one subdirectory per project
pub const PROJECTS_DIR: &str = "projects";

const DOCKERFILE: &str = "Dockerfile";
const PROJECT_YAML: &str = "project.yaml";
const SCHEDULE_KEY: &str = "schedule";

/// Read the builds-per-day setting out of a `project.yaml` document
///
/// An empty document counts as an empty mapping.
pub fn parse_builds_per_day(contents: &[u8]) -> Result<BuildsPerDay, ProjectYamlError> {
    match serde_yaml::from_slice::<Value>(contents)? {
        Value::Null => Ok(BuildsPerDay::default()),
        Value::Mapping(mapping) => match mapping.get(SCHEDULE_KEY) {
            Some(value) => Ok(BuildsPerDay::from_yaml(value)?),
            None => Ok(BuildsPerDay::default()),
        },
        _ => Err(ProjectYamlError::NotAMapping),
    }
}

/// Walk `projects_dir` and compute the desired schedule of every project
///
/// Projects with a malformed `project.yaml` are logged and left out, as are
/// projects whose `project.yaml` is not a regular file or comes back in an
/// encoding that cannot be decoded. Any failure to reach the repository
/// aborts discovery, since reconciling against a partial listing would
/// delete the jobs of unread projects.
pub async fn discover_projects(
    repo: &dyn RepositoryBrowser,
    projects_dir: &str,
) -> RepositoryResult<DesiredProjects> {
    let mut projects = DesiredProjects::new();

    for entry in repo.list_directory(projects_dir).await? {
        if !entry.is_dir() || !is_valid_project_name(&entry.name) {
            tracing::debug!(path = %entry.path, "Skipping non-project entry");
            continue;
        }

        let contents = repo.list_directory(&entry.path).await?;
        if !contents.iter().any(|file| file.name == DOCKERFILE) {
            tracing::debug!(project = %entry.name, "Skipping project without Dockerfile");
            continue;
        }

        let builds_per_day = match contents.iter().find(|file| file.name == PROJECT_YAML) {
            Some(file) => {
                let yaml = match repo.read_file(&file.path).await {
                    Ok(yaml) => yaml,
                    Err(
                        e @ (RepositoryError::UnexpectedKind { .. } | RepositoryError::Decode(_)),
                    ) => {
                        tracing::error!(
                            project = %entry.name,
                            error = %e,
                            "Unreadable project.yaml"
                        );
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                match parse_builds_per_day(&yaml) {
                    Ok(builds) => builds,
                    Err(e) => {
                        tracing::error!(
                            project = %entry.name,
                            error = %e,
                            "Incorrect format for project.yaml"
                        );
                        continue;
                    }
                }
            }
            None => BuildsPerDay::default(),
        };

        projects.insert(entry.name, builds_per_day.cron_expression());
    }

    tracing::info!(count = projects.len(), "Discovered projects");
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RepositoryError, ScheduleError};
    use crate::repository::InMemoryRepository;

    fn project(repo: InMemoryRepository, name: &str, yaml: Option<&str>) -> InMemoryRepository {
        let repo = repo.with_file(&format!("projects/{name}/Dockerfile"), "FROM base");
        match yaml {
            Some(yaml) => repo.with_file(&format!("projects/{name}/project.yaml"), yaml),
            None => repo,
        }
    }

    fn desired(entries: &[(&str, &str)]) -> DesiredProjects {
        entries
            .iter()
            .map(|(name, schedule)| (name.to_string(), schedule.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_schedules_from_yaml() {
        let repo = project(InMemoryRepository::new(), "test0", Some("schedule: 2"));
        let repo = project(repo, "test1", Some("schedule: 3"));

        let projects = discover_projects(&repo, PROJECTS_DIR).await.unwrap();
        assert_eq!(
            projects,
            desired(&[("test0", "0 6,18 * * *"), ("test1", "0 6,14,22 * * *")])
        );
    }

    #[tokio::test]
    async fn test_default_schedule() {
        let repo = project(InMemoryRepository::new(), "with_yaml", Some("name: test"));
        let repo = project(repo, "without-yaml", None);

        let projects = discover_projects(&repo, PROJECTS_DIR).await.unwrap();
        assert_eq!(
            projects,
            desired(&[("with_yaml", "0 6 * * *"), ("without-yaml", "0 6 * * *")])
        );
    }

    #[tokio::test]
    async fn test_missing_dockerfile_excluded() {
        let repo = project(InMemoryRepository::new(), "test0", Some("name: test"))
            .with_file("projects/test1/project.yaml", "schedule: 2")
            .with_dir("projects/test2");

        let projects = discover_projects(&repo, PROJECTS_DIR).await.unwrap();
        assert_eq!(projects, desired(&[("test0", "0 6 * * *")]));
    }

    #[tokio::test]
    async fn test_invalid_project_name_excluded() {
        let repo = project(InMemoryRepository::new(), "test0", Some("name: test"));
        let repo = project(repo, "test1@", Some("name: test"));

        let projects = discover_projects(&repo, PROJECTS_DIR).await.unwrap();
        assert_eq!(projects, desired(&[("test0", "0 6 * * *")]));
    }

    #[tokio::test]
    async fn test_non_directory_entry_excluded() {
        let repo = project(InMemoryRepository::new(), "test0", Some("name: test"))
            .with_file("projects/test1", "not a directory");

        let projects = discover_projects(&repo, PROJECTS_DIR).await.unwrap();
        assert_eq!(projects, desired(&[("test0", "0 6 * * *")]));
    }

    #[tokio::test]
    async fn test_invalid_schedule_excluded() {
        let invalid = [
            "schedule: some-string",
            "schedule: 5",
            "schedule: 0",
            "- a\n- b",
            "schedule: [1, 2",
        ];
        for yaml in invalid {
            let repo = project(InMemoryRepository::new(), "test0", Some(yaml));
            let projects = discover_projects(&repo, PROJECTS_DIR).await.unwrap();
            assert!(projects.is_empty(), "{yaml:?} should exclude the project");
        }
    }

    #[tokio::test]
    async fn test_bad_project_does_not_block_others() {
        let repo = project(InMemoryRepository::new(), "bad", Some("schedule: 9"));
        let repo = project(repo, "good", Some("schedule: 4"));

        let projects = discover_projects(&repo, PROJECTS_DIR).await.unwrap();
        assert_eq!(projects, desired(&[("good", "0 6,12,18,0 * * *")]));
    }

    #[tokio::test]
    async fn test_project_yaml_directory_does_not_block_others() {
        let repo = project(InMemoryRepository::new(), "good", Some("schedule: 2"))
            .with_file("projects/weird/Dockerfile", "FROM base")
            .with_dir("projects/weird/project.yaml");

        let projects = discover_projects(&repo, PROJECTS_DIR).await.unwrap();
        assert_eq!(projects, desired(&[("good", "0 6,18 * * *")]));
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let repo = InMemoryRepository::new().with_dir("other");
        assert!(matches!(
            discover_projects(&repo, PROJECTS_DIR).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_builds_per_day() {
        assert_eq!(parse_builds_per_day(b"schedule: 4").unwrap().get(), 4);
        assert_eq!(parse_builds_per_day(b"language: c++").unwrap().get(), 1);
        assert!(matches!(
            parse_builds_per_day(b"schedule: 5"),
            Err(ProjectYamlError::Schedule(ScheduleError::OutOfRange { value: 5, .. }))
        ));
        assert!(matches!(
            parse_builds_per_day(b"just a string"),
            Err(ProjectYamlError::NotAMapping)
        ));
    }
}
