use crate::components::redis_service::RedisActorHandle;
use crate::config::Config;
use crate::error::DeskResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

// Export components
pub mod calendar_sync;
pub mod event_store;
pub mod free_time;
pub mod google_calendar;
pub mod journal;
pub mod redis_service;
pub mod tasks;

pub use calendar_sync::CalendarSync;
pub use event_store::{CalendarEvent, EventStore};
pub use free_time::{compute_free_intervals, TimeInterval};
pub use google_calendar::CalendarProvider;

/// Long-running component started in watch mode
#[async_trait]
pub trait Component: Send + Sync {
    /// Get the name of the component
    fn name(&self) -> &'static str;

    /// Initialize the component
    async fn init(&self, config: Arc<RwLock<Config>>, redis_handle: RedisActorHandle) -> DeskResult<()>;

    /// Shutdown the component
    async fn shutdown(&self) -> DeskResult<()>;
}

/// Starts and stops the watch-mode components
pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
    config: Arc<RwLock<Config>>,
    running: Mutex<Vec<usize>>,
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("components", &self.names())
            .finish()
    }
}

impl ComponentManager {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            components: Vec::new(),
            config,
            running: Mutex::new(Vec::new()),
        }
    }

    pub fn register<T: Component + 'static>(&mut self, component: T) {
        info!("Registering component: {}", component.name());
        self.components.push(Box::new(component));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Start every registered component; one failing to start does not stop
    /// the others. Returns how many are running.
    pub async fn init_all(&self, redis_handle: RedisActorHandle) -> DeskResult<usize> {
        let mut running = self.running.lock().await;

        for (index, component) in self.components.iter().enumerate() {
            if running.contains(&index) {
                continue;
            }
            info!("Initializing component: {}", component.name());

            match component
                .init(Arc::clone(&self.config), redis_handle.clone())
                .await
            {
                Ok(()) => running.push(index),
                Err(e) => error!("Error initializing component {}: {}", component.name(), e),
            }
        }

        Ok(running.len())
    }

    /// Stop the running components, newest first
    pub async fn shutdown_all(&self) -> DeskResult<()> {
        let mut running = self.running.lock().await;
        info!("Shutting down {} component(s)", running.len());

        while let Some(index) = running.pop() {
            let Some(component) = self.components.get(index) else {
                continue;
            };
            info!("Shutting down component: {}", component.name());

            if let Err(e) = component.shutdown().await {
                error!("Error shutting down component {}: {:?}", component.name(), e);
            }
        }

        Ok(())
    }
}
