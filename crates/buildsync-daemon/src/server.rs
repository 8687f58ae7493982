//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, SchedulerConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::trigger::SyncTrigger;
use buildsync::repository::{GitHubConnector, LocalRepository, RepositoryConnector};
use buildsync::scheduler::{CloudSchedulerClient, InMemoryScheduler, JobScheduler};
use buildsync::storage::{InMemoryStorage, Storage};
use buildsync::{SyncOutcome, SyncService};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// buildsync daemon server
pub struct Server {
    config: DaemonConfig,
    storage: Arc<dyn Storage>,
    trigger: Arc<SyncTrigger>,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let storage = create_storage(&config.storage).await?;

        if let Some(token) = &config.repository.access_token {
            storage.set_access_token(token).await?;
            tracing::info!("Stored repository access token from configuration");
        }

        let connector: Arc<dyn RepositoryConnector> = match &config.repository.local_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Reading projects from local checkout");
                Arc::new(LocalRepository::new(path.clone()))
            }
            None => {
                let github = &config.repository.github;
                tracing::info!(
                    owner = %github.owner,
                    name = %github.name,
                    "Reading projects from GitHub"
                );
                Arc::new(GitHubConnector::new(github.clone()))
            }
        };

        let scheduler: Arc<dyn JobScheduler> = match &config.scheduler {
            SchedulerConfig::Memory => {
                tracing::warn!("Using in-memory scheduler, no build jobs will actually run");
                Arc::new(InMemoryScheduler::new())
            }
            SchedulerConfig::Cloud(cloud) => {
                tracing::info!(
                    project_id = %cloud.project_id,
                    location = %cloud.location,
                    "Using Cloud Scheduler"
                );
                Arc::new(CloudSchedulerClient::new(cloud)?)
            }
        };

        let service = SyncService::new(
            storage.clone(),
            connector,
            scheduler,
            config.repository.projects_dir.clone(),
        );

        Ok(Self {
            config,
            storage,
            trigger: Arc::new(SyncTrigger::new(service)),
        })
    }

    /// Run a single pass and return, without serving HTTP
    pub async fn run_once(&self) -> DaemonResult<SyncOutcome> {
        Ok(self.trigger.service().run_once().await?)
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(self.storage.clone(), self.trigger.clone());
        let app = create_router(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("buildsync daemon listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timer = match self.config.sync.interval_secs {
            0 => {
                tracing::info!("Sync timer disabled, passes run only on request");
                None
            }
            secs => Some(tokio::spawn(self.trigger.clone().run_periodic(
                Duration::from_secs(secs),
                self.config.sync.run_on_startup,
                shutdown_rx,
            ))),
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("buildsync daemon shutting down");

        // Let an in-flight timer pass finish
        let _ = shutdown_tx.send(true);
        if let Some(timer) = timer {
            if let Err(e) = timer.await {
                tracing::error!(error = %e, "Sync timer task failed");
            }
        }

        Ok(())
    }
}

async fn create_storage(config: &StorageConfig) -> DaemonResult<Arc<dyn Storage>> {
    match config {
        StorageConfig::Memory => {
            tracing::info!("Using in-memory storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            tracing::info!("Using PostgreSQL storage");
            let storage = buildsync::storage::PostgresStorage::new(
                url,
                *max_connections,
                *connect_timeout_secs,
            )
            .await?;
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => Err(DaemonError::Config(
            "PostgreSQL storage requires the `postgres` feature".to_string(),
        )),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
