#![allow(dead_code)]

pub mod fake_redis;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use lifedesk::components::calendar_sync::{LockLease, SyncLock};
use lifedesk::components::event_store::{CalendarEvent, EventPatch, EventQuery, EventStore};
use lifedesk::components::google_calendar::CalendarProvider;
use lifedesk::components::tasks::{Task, TaskFilter, TaskStore};
use lifedesk::error::{adapter_error, conflict_error, not_found, DeskResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Time on 2024-06-03 at UTC+2
pub fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 6, 3, hour, minute, 0)
        .unwrap()
}

pub fn event(title: &str, start: u32, end: u32) -> CalendarEvent {
    CalendarEvent::new(title, at(start, 0), at(end, 0)).unwrap()
}

/// In-memory event store enforcing external id uniqueness
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<HashMap<String, CalendarEvent>>,
    next_id: AtomicUsize,
    pub fail_inserts: Mutex<bool>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, returning its internal id
    pub fn seed(&self, event: CalendarEvent) -> String {
        let id = format!("local-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = event.with_internal_id(id.clone());
        self.events.lock().unwrap().insert(id.clone(), record);
        id
    }

    pub fn snapshot(&self) -> Vec<CalendarEvent> {
        let mut events: Vec<CalendarEvent> = self.events.lock().unwrap().values().cloned().collect();
        events.sort_by_key(|e| e.start_time);
        events
    }

    pub fn get(&self, id: &str) -> Option<CalendarEvent> {
        self.events.lock().unwrap().get(id).cloned()
    }

    fn external_id_taken(events: &HashMap<String, CalendarEvent>, external_id: &str, owner: Option<&str>) -> bool {
        events.values().any(|e| {
            e.external_id.as_deref() == Some(external_id) && e.internal_id.as_deref() != owner
        })
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: CalendarEvent) -> DeskResult<String> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(adapter_error("memory.insert", &event.title, "store unavailable"));
        }
        let mut events = self.events.lock().unwrap();
        if let Some(external_id) = event.external_id.as_deref() {
            if Self::external_id_taken(&events, external_id, None) {
                return Err(conflict_error(&format!("external id {} already stored", external_id)));
            }
        }
        let id = format!("local-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        events.insert(id.clone(), event.with_internal_id(id.clone()));
        Ok(id)
    }

    async fn find(&self, query: &EventQuery) -> DeskResult<Vec<CalendarEvent>> {
        let mut found: Vec<CalendarEvent> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.start_time);
        Ok(found)
    }

    async fn update(&self, internal_id: &str, patch: EventPatch) -> DeskResult<()> {
        let mut events = self.events.lock().unwrap();
        let current = events
            .get(internal_id)
            .cloned()
            .ok_or_else(|| not_found("event", internal_id))?;
        if let Some(external_id) = patch.external_id.as_deref() {
            if Self::external_id_taken(&events, external_id, Some(internal_id)) {
                return Err(conflict_error(&format!("external id {} already stored", external_id)));
            }
        }
        let patched = patch.apply(&current)?;
        events.insert(internal_id.to_string(), patched);
        Ok(())
    }

    async fn delete(&self, internal_id: &str) -> DeskResult<()> {
        self.events
            .lock()
            .unwrap()
            .remove(internal_id)
            .map(|_| ())
            .ok_or_else(|| not_found("event", internal_id))
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl MemoryTaskStore {
    pub fn with(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks.into_iter().map(|t| (t.id.clone(), t)).collect()),
        }
    }

    pub fn get_now(&self, id: &str) -> Option<Task> {
        self.tasks.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get(&self, id: &str) -> DeskResult<Option<Task>> {
        Ok(self.get_now(id))
    }

    async fn list(&self, filter: TaskFilter) -> DeskResult<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn save(&self, task: &Task) -> DeskResult<()> {
        task.validate()?;
        self.tasks.lock().unwrap().insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> DeskResult<()> {
        self.tasks
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("task", id))
    }
}

/// Provider call as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    List,
    Create(String),
    Update(String),
    Delete(String),
}

/// Calendar provider keeping events in memory and recording every call
#[derive(Default)]
pub struct MockCalendarProvider {
    events: Mutex<Vec<CalendarEvent>>,
    calls: Mutex<Vec<ProviderCall>>,
    next_id: AtomicUsize,
    pub fail_creates: Mutex<bool>,
}

impl MockCalendarProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a remote event under `external_id`
    pub fn seed(&self, external_id: &str, event: CalendarEvent) {
        self.events
            .lock()
            .unwrap()
            .push(event.with_external_id(external_id));
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn remote_events(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn remove_remote(&self, external_id: &str) {
        self.events
            .lock()
            .unwrap()
            .retain(|e| e.external_id.as_deref() != Some(external_id));
    }
}

#[async_trait]
impl CalendarProvider for MockCalendarProvider {
    async fn list_events(
        &self,
        _calendar_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> DeskResult<Vec<CalendarEvent>> {
        self.calls.lock().unwrap().push(ProviderCall::List);
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.start_time < end && e.end_time > start)
            .cloned()
            .collect())
    }

    async fn create_event(&self, _calendar_id: &str, event: &CalendarEvent) -> DeskResult<CalendarEvent> {
        self.calls
            .lock()
            .unwrap()
            .push(ProviderCall::Create(event.title.clone()));
        if *self.fail_creates.lock().unwrap() {
            return Err(adapter_error("mock.create_event", &event.title, "HTTP 500"));
        }
        let external_id = format!("remote-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut created = event.clone().with_external_id(external_id);
        created.internal_id = None;
        self.events.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_event(
        &self,
        _calendar_id: &str,
        external_id: &str,
        event: &CalendarEvent,
    ) -> DeskResult<CalendarEvent> {
        self.calls
            .lock()
            .unwrap()
            .push(ProviderCall::Update(external_id.to_string()));
        let mut events = self.events.lock().unwrap();
        let slot = events
            .iter_mut()
            .find(|e| e.external_id.as_deref() == Some(external_id))
            .ok_or_else(|| not_found("remote event", external_id))?;
        let mut updated = event.clone().with_external_id(external_id);
        updated.internal_id = None;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_event(&self, _calendar_id: &str, external_id: &str) -> DeskResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(ProviderCall::Delete(external_id.to_string()));
        self.remove_remote(external_id);
        Ok(())
    }
}

/// Lock that is either always free or always held elsewhere
pub struct MockLock {
    held_elsewhere: bool,
    pub releases: AtomicUsize,
}

impl MockLock {
    pub fn free() -> Self {
        Self {
            held_elsewhere: false,
            releases: AtomicUsize::new(0),
        }
    }

    pub fn held() -> Self {
        Self {
            held_elsewhere: true,
            releases: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SyncLock for MockLock {
    async fn acquire(&self, calendar_id: &str) -> DeskResult<Option<LockLease>> {
        if self.held_elsewhere {
            return Ok(None);
        }
        Ok(Some(LockLease {
            calendar_id: calendar_id.to_string(),
            token: "test-token".to_string(),
        }))
    }

    async fn release(&self, _lease: LockLease) -> DeskResult<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
