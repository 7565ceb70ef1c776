use super::lock::SyncLock;
use super::reconcile::{synchronize, SyncOperation, SyncPlan};
use crate::components::event_store::{CalendarEvent, EventPatch, EventQuery, EventStore};
use crate::components::free_time::TimeInterval;
use crate::components::google_calendar::CalendarProvider;
use crate::error::{adapter_error, conflict_error, validation_error, DeskResult};
use chrono::{DateTime, Duration, FixedOffset};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Counts of applied operations for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created_local: usize,
    pub updated_local: usize,
    pub created_remote: usize,
    pub linked_local: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.created_local + self.updated_local + self.created_remote + self.linked_local
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created locally, {} updated locally, {} re-created remotely, {} relinked",
            self.created_local, self.updated_local, self.created_remote, self.linked_local
        )
    }
}

/// Runs reconciliation passes between one provider calendar and the local store
pub struct SyncEngine {
    calendar_id: String,
    window_days: i64,
    provider: Arc<dyn CalendarProvider>,
    store: Arc<dyn EventStore>,
    lock: Arc<dyn SyncLock>,
}

impl SyncEngine {
    pub fn new(
        calendar_id: impl Into<String>,
        window_days: i64,
        provider: Arc<dyn CalendarProvider>,
        store: Arc<dyn EventStore>,
        lock: Arc<dyn SyncLock>,
    ) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            window_days,
            provider,
            store,
            lock,
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// `[now, now + window_days)`, rejected when it leaves chrono's date range
    fn window_from(&self, now: DateTime<FixedOffset>) -> DeskResult<TimeInterval> {
        let end = Duration::try_days(self.window_days)
            .filter(|_| self.window_days > 0)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                validation_error(&format!(
                    "Sync window of {} days from {} is out of range",
                    self.window_days, now
                ))
            })?;
        TimeInterval::new(now, end)
    }

    /// Run one pass over `[now, now + window)` while holding the calendar lock
    pub async fn run_once(&self, now: DateTime<FixedOffset>) -> DeskResult<SyncReport> {
        let window = self.window_from(now)?;
        let lease = self.lock.acquire(&self.calendar_id).await?.ok_or_else(|| {
            conflict_error(&format!(
                "Synchronization for calendar {} is already running",
                self.calendar_id
            ))
        })?;

        let result = self.sync_window(window).await;

        if let Err(e) = self.lock.release(lease).await {
            warn!("Failed to release sync lock for {}: {}", self.calendar_id, e);
        }

        result
    }

    async fn sync_window(&self, window: TimeInterval) -> DeskResult<SyncReport> {
        let (remote, local) = self.snapshot(window).await?;

        let plan = synchronize(&remote, &local);
        info!(
            "Calendar {}: {} remote, {} local linked, {} planned operations",
            self.calendar_id,
            remote.len(),
            local.len(),
            plan.len()
        );

        self.apply(&plan).await
    }

    /// Fetch both sides once; the plan is computed against this snapshot only
    async fn snapshot(&self, window: TimeInterval) -> DeskResult<(Vec<CalendarEvent>, Vec<CalendarEvent>)> {
        let local_query = EventQuery::overlapping(window).linked(true);
        let (remote, mut local) = futures::try_join!(
            self.provider.list_events(&self.calendar_id, window.start, window.end),
            self.store.find(&local_query),
        )?;

        // Records whose provider copy moved into the window from outside it
        let known: HashSet<String> = local.iter().filter_map(|l| l.external_id.clone()).collect();
        for remote_event in &remote {
            let Some(external_id) = &remote_event.external_id else {
                continue;
            };
            if known.contains(external_id) {
                continue;
            }
            let outside = self.store.find(&EventQuery::by_external_id(external_id.clone())).await?;
            local.extend(outside);
        }

        Ok((remote, local))
    }

    /// Apply `plan` in order; the first failure stops the pass
    pub async fn apply(&self, plan: &SyncPlan) -> DeskResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut created_remote: HashMap<String, String> = HashMap::new();

        for operation in &plan.operations {
            debug!("Applying: {}", operation);
            if let Err(e) = self.apply_one(operation, &mut created_remote, &mut report).await {
                error!(
                    "Sync of calendar {} stopped at '{}' after {} operations: {}",
                    self.calendar_id,
                    operation,
                    report.total(),
                    e
                );
                return Err(e);
            }
        }

        Ok(report)
    }

    async fn apply_one(
        &self,
        operation: &SyncOperation,
        created_remote: &mut HashMap<String, String>,
        report: &mut SyncReport,
    ) -> DeskResult<()> {
        match operation {
            SyncOperation::CreateLocal(remote) => {
                let mut record = remote.clone();
                record.internal_id = None;
                self.store.insert(record).await?;
                report.created_local += 1;
            }
            SyncOperation::UpdateLocal { internal_id, remote } => {
                self.store
                    .update(internal_id, EventPatch::content_of(remote))
                    .await?;
                report.updated_local += 1;
            }
            SyncOperation::CreateRemote(local) => {
                let internal_id = local
                    .internal_id
                    .clone()
                    .ok_or_else(|| validation_error("Only stored events can be re-created remotely"))?;

                let created = self.provider.create_event(&self.calendar_id, local).await?;
                let external_id = created.external_id.ok_or_else(|| {
                    adapter_error("google.create_event", &internal_id, "Provider returned no event id")
                })?;

                created_remote.insert(internal_id, external_id);
                report.created_remote += 1;
            }
            SyncOperation::LinkLocal { internal_id } => {
                let external_id = created_remote.remove(internal_id).ok_or_else(|| {
                    validation_error(&format!("No remote event was created for {}", internal_id))
                })?;
                self.store
                    .update(internal_id, EventPatch::link(external_id))
                    .await?;
                report.linked_local += 1;
            }
        }
        Ok(())
    }
}
