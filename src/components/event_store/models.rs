use crate::components::free_time::TimeInterval;
use crate::error::{validation_error, DeskResult, Error};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Calendar event shared by the local store and the external provider
///
/// Local records always carry an `internal_id`; events fetched from the
/// provider carry only an `external_id`. A record holding both is linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct CalendarEvent {
    pub internal_id: Option<String>,
    pub external_id: Option<String>,
    pub title: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub description: Option<String>,
}

/// Unvalidated wire shape of a stored event
#[derive(Deserialize)]
struct EventRecord {
    #[serde(default)]
    internal_id: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
    title: String,
    start_time: DateTime<FixedOffset>,
    end_time: DateTime<FixedOffset>,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<EventRecord> for CalendarEvent {
    type Error = Error;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let event = CalendarEvent {
            internal_id: record.internal_id,
            external_id: record.external_id,
            title: record.title,
            start_time: record.start_time,
            end_time: record.end_time,
            description: record.description,
        };
        event.validate()?;
        Ok(event)
    }
}

impl CalendarEvent {
    /// Create a new unlinked event
    pub fn new(
        title: impl Into<String>,
        start_time: DateTime<FixedOffset>,
        end_time: DateTime<FixedOffset>,
    ) -> DeskResult<Self> {
        let event = Self {
            internal_id: None,
            external_id: None,
            title: title.into(),
            start_time,
            end_time,
            description: None,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_internal_id(mut self, internal_id: impl Into<String>) -> Self {
        self.internal_id = Some(internal_id.into());
        self
    }

    /// Check the record invariants
    pub fn validate(&self) -> DeskResult<()> {
        if self.title.trim().is_empty() {
            return Err(validation_error("Event title must not be empty"));
        }
        if self.start_time >= self.end_time {
            return Err(validation_error(&format!(
                "Event '{}' must start before it ends",
                self.title
            )));
        }
        for id in [&self.internal_id, &self.external_id].into_iter().flatten() {
            if id.trim().is_empty() {
                return Err(validation_error("Event identifiers must not be blank"));
            }
        }
        Ok(())
    }

    /// Whether the event is mirrored on the provider
    pub fn is_linked(&self) -> bool {
        self.external_id.is_some()
    }

    /// Whether title, times or description differ from `other`
    pub fn content_differs(&self, other: &CalendarEvent) -> bool {
        self.title != other.title
            || self.start_time != other.start_time
            || self.end_time != other.end_time
            || self.description != other.description
    }

    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Short identifier for logs
    pub fn label(&self) -> &str {
        self.internal_id
            .as_deref()
            .or(self.external_id.as_deref())
            .unwrap_or("<new>")
    }
}

/// Partial update of a stored event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub end_time: Option<DateTime<FixedOffset>>,
    pub description: Option<Option<String>>,
    pub external_id: Option<String>,
}

impl EventPatch {
    /// Copy title, times and description from `source`
    pub fn content_of(source: &CalendarEvent) -> Self {
        Self {
            title: Some(source.title.clone()),
            start_time: Some(source.start_time),
            end_time: Some(source.end_time),
            description: Some(source.description.clone()),
            external_id: None,
        }
    }

    /// Attach an external id
    pub fn link(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the patched event, validated
    pub fn apply(&self, event: &CalendarEvent) -> DeskResult<CalendarEvent> {
        let mut patched = event.clone();
        if let Some(title) = &self.title {
            patched.title = title.clone();
        }
        if let Some(start_time) = self.start_time {
            patched.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            patched.end_time = end_time;
        }
        if let Some(description) = &self.description {
            patched.description = description.clone();
        }
        if let Some(external_id) = &self.external_id {
            patched.external_id = Some(external_id.clone());
        }
        patched.validate()?;
        Ok(patched)
    }
}

/// Structural filter over stored events; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub internal_id: Option<String>,
    pub external_id: Option<String>,
    pub linked: Option<bool>,
    pub overlapping: Option<TimeInterval>,
}

impl EventQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(internal_id: impl Into<String>) -> Self {
        Self {
            internal_id: Some(internal_id.into()),
            ..Default::default()
        }
    }

    pub fn by_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Default::default()
        }
    }

    /// Events sharing any instant with `window`
    pub fn overlapping(window: TimeInterval) -> Self {
        Self {
            overlapping: Some(window),
            ..Default::default()
        }
    }

    pub fn linked(mut self, linked: bool) -> Self {
        self.linked = Some(linked);
        self
    }

    pub fn matches(&self, event: &CalendarEvent) -> bool {
        if let Some(id) = &self.internal_id {
            if event.internal_id.as_ref() != Some(id) {
                return false;
            }
        }
        if let Some(id) = &self.external_id {
            if event.external_id.as_ref() != Some(id) {
                return false;
            }
        }
        if let Some(linked) = self.linked {
            if event.is_linked() != linked {
                return false;
            }
        }
        if let Some(window) = &self.overlapping {
            if !event.interval().overlaps(window) {
                return false;
            }
        }
        true
    }
}
