use super::engine::SyncEngine;
use crate::config::Config;
use crate::error::DeskResult;
use crate::utils::scheduler::Scheduler;
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration as TokioDuration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Periodic sync passes for the calendar sync component
pub struct CalendarSyncScheduler;

impl Scheduler for CalendarSyncScheduler {
    type Handle = Arc<SyncEngine>;

    fn start(
        config: Arc<RwLock<Config>>,
        handle: Self::Handle,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = DeskResult<JoinHandle<()>>> + Send>> {
        Box::pin(async move {
            let interval_secs = config.read().await.sync_interval_secs.max(1);

            let task = tokio::spawn(async move {
                info!(
                    "Syncing calendar {} every {} seconds",
                    handle.calendar_id(),
                    interval_secs
                );

                loop {
                    match handle.run_once(Utc::now().fixed_offset()).await {
                        Ok(report) if report.total() > 0 => info!("Sync finished: {}", report),
                        Ok(_) => info!("Sync finished: calendar already in sync"),
                        Err(e) => error!("Sync failed: {}", e),
                    }

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("Calendar sync scheduler stopped");
                            break;
                        }
                        _ = sleep(TokioDuration::from_secs(interval_secs)) => {}
                    }
                }
            });

            Ok(task)
        })
    }
}
