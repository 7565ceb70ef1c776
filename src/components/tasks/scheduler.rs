use super::models::Task;
use super::store::TaskStore;
use crate::components::calendar_sync::SyncLock;
use crate::components::event_store::{CalendarEvent, EventQuery, EventStore};
use crate::components::free_time::{compute_free_intervals, TimeInterval};
use crate::components::google_calendar::CalendarProvider;
use crate::error::{adapter_error, conflict_error, not_found, validation_error, DeskResult};
use crate::utils::time::format_duration;
use crate::utils::validate_id;
use chrono::{DateTime, FixedOffset};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Free intervals long enough to hold `task`, in input order
pub fn suggest_slots(task: &Task, free_intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    let needed = task.duration();
    free_intervals
        .iter()
        .filter(|interval| interval.can_fit(needed))
        .copied()
        .collect()
}

/// Free time inside `window` left over by the stored events, never earlier than `now`
pub async fn free_intervals_in(
    events: &dyn EventStore,
    window: &TimeInterval,
    now: DateTime<FixedOffset>,
) -> DeskResult<Vec<TimeInterval>> {
    let busy: Vec<TimeInterval> = events
        .find(&EventQuery::overlapping(*window))
        .await?
        .iter()
        .map(CalendarEvent::interval)
        .collect();

    let reference_start = now.max(window.start);
    debug!(
        "Computing free time from {} to {} around {} busy intervals",
        reference_start,
        window.end,
        busy.len()
    );
    Ok(compute_free_intervals(&busy, window.end, reference_start))
}

/// Free-text back-reference stored on events created for a task
pub fn task_reference(task_id: &str) -> String {
    format!("task:{}", task_id)
}

/// Places tasks on the calendar and keeps task, event and provider in step.
///
/// Every change holds the calendar's sync lock, so it never interleaves with a sync pass.
pub struct TaskScheduler {
    calendar_id: String,
    tasks: Arc<dyn TaskStore>,
    events: Arc<dyn EventStore>,
    provider: Arc<dyn CalendarProvider>,
    lock: Arc<dyn SyncLock>,
}

impl TaskScheduler {
    pub fn new(
        calendar_id: impl Into<String>,
        tasks: Arc<dyn TaskStore>,
        events: Arc<dyn EventStore>,
        provider: Arc<dyn CalendarProvider>,
        lock: Arc<dyn SyncLock>,
    ) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            tasks,
            events,
            provider,
            lock,
        }
    }

    /// Run `operation` while holding the calendar lock; a held lock is a conflict
    async fn locked<T, F, Fut>(&self, operation: F) -> DeskResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DeskResult<T>>,
    {
        let lease = self.lock.acquire(&self.calendar_id).await?.ok_or_else(|| {
            conflict_error(&format!(
                "Calendar {} is being synchronized, try again shortly",
                self.calendar_id
            ))
        })?;

        let result = operation().await;

        if let Err(e) = self.lock.release(lease).await {
            warn!("Failed to release sync lock for {}: {}", self.calendar_id, e);
        }

        result
    }

    async fn load_task(&self, task_id: &str) -> DeskResult<Task> {
        validate_id("task", task_id)?;
        self.tasks
            .get(task_id)
            .await?
            .ok_or_else(|| not_found("task", task_id))
    }

    /// Free time inside `window`, never earlier than `now`
    pub async fn free_intervals_for(
        &self,
        window: &TimeInterval,
        now: DateTime<FixedOffset>,
    ) -> DeskResult<Vec<TimeInterval>> {
        free_intervals_in(self.events.as_ref(), window, now).await
    }

    /// Book `slot` for the task on the provider and in the local store
    pub async fn schedule_task(&self, task_id: &str, slot: &TimeInterval) -> DeskResult<Task> {
        validate_id("task", task_id)?;
        self.locked(|| self.book(task_id, slot)).await
    }

    /// Remove the linked event everywhere and reset the task
    pub async fn unschedule_task(&self, task_id: &str) -> DeskResult<Task> {
        validate_id("task", task_id)?;
        self.locked(|| async move {
            let task = self.load_task(task_id).await?;
            self.release_slot(task).await
        })
        .await
    }

    /// Delete a task, unscheduling it first when needed
    pub async fn delete_task(&self, task_id: &str) -> DeskResult<Task> {
        validate_id("task", task_id)?;
        self.locked(|| async move {
            let task = self.load_task(task_id).await?;
            let task = if task.scheduled {
                self.release_slot(task).await?
            } else {
                task
            };
            self.tasks.delete(&task.id).await?;
            Ok(task)
        })
        .await
    }

    async fn book(&self, task_id: &str, slot: &TimeInterval) -> DeskResult<Task> {
        let mut task = self.load_task(task_id).await?;

        if task.scheduled {
            return Err(validation_error(&format!(
                "Task '{}' is already scheduled",
                task.title
            )));
        }
        let duration = task.duration();
        if !slot.can_fit(duration) {
            return Err(validation_error(&format!(
                "Slot {} is shorter than the {} needed for '{}'",
                slot,
                format_duration(duration),
                task.title
            )));
        }

        let event = CalendarEvent::new(task.title.clone(), slot.start, slot.start + duration)?
            .with_description(task_reference(&task.id));

        let remote = self.provider.create_event(&self.calendar_id, &event).await?;
        let external_id = remote.external_id.clone().ok_or_else(|| {
            adapter_error("create event", &self.calendar_id, "provider returned no event id")
        })?;

        let internal_id = match self.events.insert(remote).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(cleanup) = self.provider.delete_event(&self.calendar_id, &external_id).await {
                    warn!(
                        "Failed to remove remote event {} after local insert failed: {}",
                        external_id, cleanup
                    );
                }
                return Err(e);
            }
        };

        task.mark_scheduled(internal_id, slot.start.date_naive());
        self.tasks.save(&task).await?;

        info!("Scheduled task '{}' at {}", task.title, slot.start);
        Ok(task)
    }

    async fn release_slot(&self, mut task: Task) -> DeskResult<Task> {
        let Some(event_id) = task.linked_event_id.clone() else {
            debug!("Task {} is not scheduled, nothing to do", task.id);
            return Ok(task);
        };

        let linked = self.events.find(&EventQuery::by_id(event_id.clone())).await?;
        if let Some(event) = linked.into_iter().next() {
            if let Some(external_id) = event.external_id.as_deref() {
                self.provider.delete_event(&self.calendar_id, external_id).await?;
            }
            match self.events.delete(&event_id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        } else {
            warn!(
                "Linked event {} for task {} is already gone",
                event_id, task.id
            );
        }

        task.clear_schedule();
        self.tasks.save(&task).await?;

        info!("Unscheduled task '{}'", task.title);
        Ok(task)
    }
}
