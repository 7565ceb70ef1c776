use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::DeskResult;

/// Trait for component schedulers that run periodic work
pub trait Scheduler: Send + 'static {
    /// The type of handle used by this scheduler
    type Handle: Clone + Send + Sync + 'static;

    /// Start the scheduler; it runs until `cancel` fires and the returned
    /// task finishes once the loop has stopped
    fn start(
        config: Arc<RwLock<Config>>,
        handle: Self::Handle,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = DeskResult<JoinHandle<()>>> + Send>>;
}
