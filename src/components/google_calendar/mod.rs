mod client;
pub mod models;
pub mod time;
pub mod token;

pub use client::GoogleCalendarClient;
pub use token::{load_credential, store_credential, Credential};

use crate::components::event_store::CalendarEvent;
use crate::error::DeskResult;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

/// Remote calendar holding the externally visible copy of events
///
/// Events returned by the provider carry their provider id in `external_id`
/// and no `internal_id`.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Events overlapping `[start, end)`
    async fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> DeskResult<Vec<CalendarEvent>>;

    /// Create an event and return it with its new external id
    async fn create_event(&self, calendar_id: &str, event: &CalendarEvent) -> DeskResult<CalendarEvent>;

    /// Replace the content of an existing event
    async fn update_event(
        &self,
        calendar_id: &str,
        external_id: &str,
        event: &CalendarEvent,
    ) -> DeskResult<CalendarEvent>;

    /// Delete an event; deleting one that is already gone succeeds
    async fn delete_event(&self, calendar_id: &str, external_id: &str) -> DeskResult<()>;
}
