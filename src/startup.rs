use crate::commands::CommandContext;
use crate::shutdown;
use lifedesk::components::redis_service::{RedisActor, RedisActorHandle};
use lifedesk::components::{CalendarSync, ComponentManager};
use lifedesk::config::Config;
use lifedesk::error::Error;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,redis=warn,reqwest=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Spawn the Redis actor and hand back its handle
async fn spawn_redis(config: &Arc<RwLock<Config>>) -> miette::Result<RedisActorHandle> {
    let (mut redis_actor, redis_handle) = {
        let config_read = config.read().await;
        RedisActor::new(&config_read)?
    };

    tokio::spawn(async move {
        redis_actor.run().await;
    });

    Ok(redis_handle)
}

/// Build the context shared by one-shot commands
pub async fn command_context(config: Arc<RwLock<Config>>) -> miette::Result<CommandContext> {
    let redis_handle = spawn_redis(&config).await?;
    Ok(CommandContext::new(config, redis_handle))
}

/// Start the enabled components and wait for a shutdown signal
pub async fn run_watch(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let redis_handle = spawn_redis(&config).await?;

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    {
        let config_read = config.read().await;
        if config_read.is_component_enabled("calendar_sync") {
            component_manager.register(CalendarSync::new());
        } else {
            info!("Calendar sync component is disabled");
        }
    }

    let component_manager = Arc::new(component_manager);
    let started = component_manager.init_all(redis_handle.clone()).await?;
    if started == 0 {
        warn!("No components are running; waiting for shutdown anyway");
    } else {
        info!("{} component(s) running: {:?}", started, component_manager.names());
    }

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    let shutdown_components = Arc::clone(&component_manager);
    let shutdown_redis = redis_handle.clone();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components, shutdown_redis).await;
    });

    match shutdown_recv.await {
        Ok(()) => info!("Shutdown complete"),
        Err(_) => {
            error!("Signal handler stopped before shutdown finished");
            component_manager.shutdown_all().await?;
            redis_handle.shutdown().await?;
        }
    }

    Ok(())
}
