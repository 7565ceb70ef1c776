pub mod models;
mod redis_store;

pub use models::{CalendarEvent, EventPatch, EventQuery};
pub use redis_store::RedisEventStore;

use crate::error::DeskResult;
use async_trait::async_trait;

/// Local persisted collection of calendar events
///
/// Implementations must keep `external_id` unique across records: inserting
/// or linking a second record with an external id already in use fails with
/// a conflict error.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a new event and return the assigned internal id
    async fn insert(&self, event: CalendarEvent) -> DeskResult<String>;

    /// All events matching `query`
    async fn find(&self, query: &EventQuery) -> DeskResult<Vec<CalendarEvent>>;

    /// Apply `patch` to the event with `internal_id`
    async fn update(&self, internal_id: &str, patch: EventPatch) -> DeskResult<()>;

    /// Remove the event with `internal_id`
    async fn delete(&self, internal_id: &str) -> DeskResult<()>;
}
