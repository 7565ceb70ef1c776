mod engine;
pub mod lock;
pub mod reconcile;
mod scheduler;

pub use engine::{SyncEngine, SyncReport};
pub use lock::{LockLease, RedisSyncLock, SyncLock};
pub use reconcile::{synchronize, SyncOperation, SyncPlan};

use super::event_store::RedisEventStore;
use super::google_calendar::{load_credential, GoogleCalendarClient};
use super::redis_service::RedisActorHandle;
use crate::config::Config;
use crate::error::DeskResult;
use crate::utils::scheduler::Scheduler;
use async_trait::async_trait;
use scheduler::CalendarSyncScheduler;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Build a sync engine wired to Google Calendar and the Redis stores
pub async fn build_engine(config: &Config, redis_handle: &RedisActorHandle) -> DeskResult<SyncEngine> {
    let credential = load_credential(config, redis_handle).await?;
    let provider = GoogleCalendarClient::new(&config.google_api_base, credential, config.tz()?)?;

    Ok(SyncEngine::new(
        config.google_calendar_id.clone(),
        config.sync_window_days,
        Arc::new(provider),
        Arc::new(RedisEventStore::new(redis_handle.clone())),
        Arc::new(RedisSyncLock::new(redis_handle.clone(), config.sync_lock_ttl_secs)),
    ))
}

/// Background component keeping the local store in sync with the calendar
#[derive(Default)]
pub struct CalendarSync {
    engine: RwLock<Option<Arc<SyncEngine>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl CalendarSync {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl super::Component for CalendarSync {
    fn name(&self) -> &'static str {
        "calendar_sync"
    }

    async fn init(&self, config: Arc<RwLock<Config>>, redis_handle: RedisActorHandle) -> DeskResult<()> {
        let mut engine_lock = self.engine.write().await;
        if engine_lock.is_some() {
            warn!("Calendar sync is already running, skipping initialization");
            return Ok(());
        }

        let engine = {
            let config_read = config.read().await;
            Arc::new(build_engine(&config_read, &redis_handle).await?)
        };
        *engine_lock = Some(Arc::clone(&engine));

        info!("Starting calendar sync scheduler");
        let task = CalendarSyncScheduler::start(config, engine, self.cancel.child_token()).await?;
        *self.task.lock().await = Some(task);
        Ok(())
    }

    async fn shutdown(&self) -> DeskResult<()> {
        self.cancel.cancel();

        // Let a pass in flight finish so its lock is released
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                error!("Calendar sync scheduler ended abnormally: {}", e);
            }
        }
        Ok(())
    }
}
