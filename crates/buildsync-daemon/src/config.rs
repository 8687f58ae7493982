//! Configuration for buildsync-daemon

use buildsync::repository::GitHubConfig;
use buildsync::scheduler::CloudSchedulerConfig;
use buildsync::PROJECTS_DIR;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable prefix, e.g. `BUILDSYNC_SYNC__INTERVAL_SECS`
pub const ENV_PREFIX: &str = "BUILDSYNC";

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Source repository configuration
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Scheduling service configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Pass triggering
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

/// Source repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// GitHub repository holding the projects
    #[serde(default)]
    pub github: GitHubConfig,

    /// Read a local checkout instead of GitHub
    #[serde(default)]
    pub local_path: Option<PathBuf>,

    /// Directory holding one subdirectory per project
    #[serde(default = "default_projects_dir")]
    pub projects_dir: String,

    /// Written to the secret store on startup when set
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            local_path: None,
            projects_dir: default_projects_dir(),
            access_token: None,
        }
    }
}

/// Scheduling service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchedulerConfig {
    /// Jobs kept in process memory; nothing is actually scheduled
    #[default]
    Memory,

    /// Google Cloud Scheduler
    Cloud(CloudSchedulerConfig),
}

/// Pass triggering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between timer passes; 0 disables the timer
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,

    /// Run a pass as soon as the daemon starts
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval(),
            run_on_startup: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_projects_dir() -> String {
    PROJECTS_DIR.to_string()
}

fn default_sync_interval() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then `path`, then `BUILDSYNC_*` variables
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert!(matches!(config.storage, StorageConfig::Memory));
        assert!(matches!(config.scheduler, SchedulerConfig::Memory));
        assert_eq!(config.repository.projects_dir, "projects");
        assert_eq!(config.repository.github.owner, "google");
        assert_eq!(config.repository.github.name, "oss-fuzz");
    }

    #[test]
    fn test_sync_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.interval_secs, 3600);
        assert!(config.run_on_startup);
    }

    #[test]
    fn test_load_without_file() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.sync.interval_secs, 3600);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
server:
  listen_addr: "0.0.0.0:9090"
storage:
  type: postgres
  url: postgres://localhost/buildsync
repository:
  projects_dir: targets
  github:
    owner: example
    name: fuzz-targets
scheduler:
  type: cloud
  project_id: build-infra
  location: europe-west1
sync:
  interval_secs: 0
"#
        )
        .unwrap();

        let config = DaemonConfig::load(file.path().to_str()).unwrap();

        assert_eq!(config.server.listen_addr.port(), 9090);
        match config.storage {
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => {
                assert_eq!(url, "postgres://localhost/buildsync");
                assert_eq!(max_connections, 10);
                assert_eq!(connect_timeout_secs, 5);
            }
            other => panic!("unexpected storage config: {other:?}"),
        }
        assert_eq!(config.repository.projects_dir, "targets");
        assert_eq!(config.repository.github.owner, "example");
        match config.scheduler {
            SchedulerConfig::Cloud(cloud) => {
                assert_eq!(cloud.project_id, "build-infra");
                assert_eq!(cloud.location, "europe-west1");
                assert_eq!(cloud.topic, "request-build");
            }
            other => panic!("unexpected scheduler config: {other:?}"),
        }
        assert_eq!(config.sync.interval_secs, 0);
        assert!(config.sync.run_on_startup);
    }

    #[test]
    fn test_environment_overrides() {
        std::env::set_var("BUILDSYNC_SERVER__ENABLE_CORS", "false");
        let config = DaemonConfig::load(None);
        std::env::remove_var("BUILDSYNC_SERVER__ENABLE_CORS");

        assert!(!config.unwrap().server.enable_cors);
    }
}
