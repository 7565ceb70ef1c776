use super::models::{GoogleEvent, GoogleEventTime};
use crate::components::event_store::CalendarEvent;
use crate::error::{validation_error, DeskResult};
use crate::utils::time::start_of_day;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;

/// Title used for provider events without a summary
pub const UNTITLED: &str = "(no title)";

/// Resolve a provider boundary; all-day dates start at midnight in `tz`
pub fn parse_event_time(time: &GoogleEventTime, tz: Tz) -> DeskResult<DateTime<FixedOffset>> {
    if let Some(date_time) = &time.date_time {
        DateTime::parse_from_rfc3339(date_time)
            .map_err(|e| validation_error(&format!("Failed to parse datetime {}: {}", date_time, e)))
    } else if let Some(date) = &time.date {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| validation_error(&format!("Failed to parse date {}: {}", date, e)))?;
        start_of_day(tz, date)
    } else {
        Err(validation_error("Event time has neither dateTime nor date"))
    }
}

/// Convert a provider event into the shared event shape
pub fn to_calendar_event(event: &GoogleEvent, tz: Tz) -> DeskResult<CalendarEvent> {
    let id = event
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| validation_error("Provider event has no id"))?;

    let start = event
        .start
        .as_ref()
        .ok_or_else(|| validation_error(&format!("Event {} has no start", id)))?;
    let end = event
        .end
        .as_ref()
        .ok_or_else(|| validation_error(&format!("Event {} has no end", id)))?;

    let title = event
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(UNTITLED);

    let mut converted = CalendarEvent::new(title, parse_event_time(start, tz)?, parse_event_time(end, tz)?)?
        .with_external_id(id);
    converted.description = event.description.clone();
    Ok(converted)
}

/// Build the provider payload for an event
pub fn to_google_event(event: &CalendarEvent) -> GoogleEvent {
    GoogleEvent {
        id: None,
        status: None,
        summary: Some(event.title.clone()),
        description: event.description.clone(),
        start: Some(GoogleEventTime {
            date_time: Some(event.start_time.to_rfc3339()),
            ..Default::default()
        }),
        end: Some(GoogleEventTime {
            date_time: Some(event.end_time.to_rfc3339()),
            ..Default::default()
        }),
    }
}
