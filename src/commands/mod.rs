use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use lifedesk::components::calendar_sync::build_engine;
use lifedesk::components::calendar_sync::{RedisSyncLock, SyncEngine};
use lifedesk::components::event_store::RedisEventStore;
use lifedesk::components::google_calendar::{load_credential, GoogleCalendarClient};
use lifedesk::components::journal::Journal;
use lifedesk::components::redis_service::RedisActorHandle;
use lifedesk::components::tasks::{RedisTaskStore, TaskScheduler};
use lifedesk::config::Config;
use lifedesk::error::DeskResult;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

pub mod auth;
pub mod calendar;
pub mod journal;
pub mod tasks;

/// Type alias for command result
pub type CommandResult = DeskResult<()>;

/// Shared context for all commands
pub struct CommandContext {
    pub config: Arc<RwLock<Config>>,
    pub redis: RedisActorHandle,
}

impl CommandContext {
    pub fn new(config: Arc<RwLock<Config>>, redis: RedisActorHandle) -> Self {
        Self { config, redis }
    }

    pub async fn tz(&self) -> DeskResult<Tz> {
        self.config.read().await.tz()
    }

    /// Current time in the configured timezone
    pub async fn now(&self) -> DeskResult<DateTime<FixedOffset>> {
        let tz = self.tz().await?;
        Ok(Utc::now().with_timezone(&tz).fixed_offset())
    }

    pub fn event_store(&self) -> Arc<RedisEventStore> {
        Arc::new(RedisEventStore::new(self.redis.clone()))
    }

    pub fn task_store(&self) -> Arc<RedisTaskStore> {
        Arc::new(RedisTaskStore::new(self.redis.clone()))
    }

    pub fn journal(&self) -> Journal {
        Journal::new(self.redis.clone())
    }

    /// Task scheduler talking to the configured calendar; needs a credential
    pub async fn task_scheduler(&self) -> DeskResult<TaskScheduler> {
        let config = self.config.read().await;
        let credential = load_credential(&config, &self.redis).await?;
        let provider = GoogleCalendarClient::new(&config.google_api_base, credential, config.tz()?)?;

        Ok(TaskScheduler::new(
            config.google_calendar_id.clone(),
            self.task_store(),
            self.event_store(),
            Arc::new(provider),
            Arc::new(RedisSyncLock::new(self.redis.clone(), config.sync_lock_ttl_secs)),
        ))
    }

    pub async fn sync_engine(&self) -> DeskResult<SyncEngine> {
        let config = self.config.read().await;
        build_engine(&config, &self.redis).await
    }

    /// Stop the Redis actor once the command is done
    pub async fn close(&self) {
        if let Err(e) = self.redis.shutdown().await {
            error!("Error shutting down Redis actor: {:?}", e);
        }
    }
}
