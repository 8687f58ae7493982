//! Pass triggering with at most one pass in flight

use crate::error::TriggerError;
use buildsync::{SyncOutcome, SyncService};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Runs sync passes on demand and on a timer
///
/// A trigger that arrives while a pass is running is refused rather than
/// queued.
pub struct SyncTrigger {
    service: SyncService,
    in_flight: Mutex<()>,
}

impl SyncTrigger {
    pub fn new(service: SyncService) -> Self {
        Self {
            service,
            in_flight: Mutex::new(()),
        }
    }

    pub fn service(&self) -> &SyncService {
        &self.service
    }

    /// Whether a pass is currently running
    pub fn is_running(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Run one pass unless another one is running
    pub async fn try_run(&self) -> Result<SyncOutcome, TriggerError> {
        let _guard = self.in_flight.try_lock().map_err(|_| TriggerError::Busy)?;

        tracing::info!("Sync pass started");
        let outcome = self.service.run_once().await?;
        tracing::info!(
            discovered = outcome.discovered,
            deleted = outcome.report.deleted.len(),
            created = outcome.report.created.len(),
            updated = outcome.report.updated.len(),
            failed = outcome.report.failures.len(),
            "Sync pass finished"
        );

        Ok(outcome)
    }

    /// Trigger a pass every `period` until `shutdown` flips to true
    pub async fn run_periodic(
        self: Arc<Self>,
        period: Duration,
        run_on_startup: bool,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !run_on_startup {
            // The first tick completes immediately
            ticker.tick().await;
        }

        tracing::info!(period_secs = period.as_secs(), "Sync timer started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.try_run().await {
                        Ok(_) => {}
                        Err(TriggerError::Busy) => {
                            tracing::warn!("Skipping timer tick, a sync pass is already running");
                        }
                        Err(TriggerError::Sync(e)) => {
                            tracing::error!(error = %e, "Timed sync pass failed");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Sync timer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildsync::repository::InMemoryRepository;
    use buildsync::scheduler::InMemoryScheduler;
    use buildsync::storage::{InMemoryStorage, SecretStorage};
    use buildsync::{SyncError, PROJECTS_DIR};

    async fn trigger(scheduler: &InMemoryScheduler) -> SyncTrigger {
        let storage = InMemoryStorage::new();
        storage.set_access_token("ghp_test").await.unwrap();
        let repository = InMemoryRepository::new()
            .with_file("projects/libpng/Dockerfile", "FROM base-builder\n");
        SyncTrigger::new(SyncService::new(
            Arc::new(storage),
            Arc::new(repository),
            Arc::new(scheduler.clone()),
            PROJECTS_DIR,
        ))
    }

    #[tokio::test]
    async fn test_try_run() {
        let scheduler = InMemoryScheduler::new();
        let trigger = trigger(&scheduler).await;

        let outcome = trigger.try_run().await.unwrap();
        assert_eq!(outcome.report.created, vec!["libpng"]);
        assert!(!trigger.is_running());
    }

    #[tokio::test]
    async fn test_refuses_while_running() {
        let scheduler = InMemoryScheduler::new();
        let trigger = trigger(&scheduler).await;

        let held = trigger.in_flight.lock().await;
        assert!(trigger.is_running());
        assert!(matches!(trigger.try_run().await, Err(TriggerError::Busy)));
        assert!(scheduler.calls().await.is_empty());
        drop(held);

        assert!(trigger.try_run().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_token_is_reported() {
        let trigger = SyncTrigger::new(SyncService::new(
            Arc::new(InMemoryStorage::new()),
            Arc::new(InMemoryRepository::new()),
            Arc::new(InMemoryScheduler::new()),
            PROJECTS_DIR,
        ));

        assert!(matches!(
            trigger.try_run().await,
            Err(TriggerError::Sync(SyncError::MissingAccessToken))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_runs_until_shutdown() {
        let scheduler = InMemoryScheduler::new();
        let trigger = Arc::new(trigger(&scheduler).await);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(trigger.clone().run_periodic(
            Duration::from_secs(60),
            true,
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_secs(150)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        // Startup pass creates the job, later ticks find nothing to do
        assert_eq!(scheduler.calls().await.len(), 1);
        assert!(scheduler.jobs().await.contains_key("libpng-scheduler"));
    }
}
