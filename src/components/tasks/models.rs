use crate::error::{validation_error, DeskResult, Error};
use crate::utils::time::hours_to_duration;
use crate::utils::validate_id;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A piece of work that can be placed into free calendar time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub duration_hours: f64,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled: bool,
    /// Internal id of the local event holding the slot
    pub linked_event_id: Option<String>,
}

#[derive(Deserialize)]
struct TaskRecord {
    id: String,
    title: String,
    duration_hours: f64,
    #[serde(default)]
    scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    scheduled: bool,
    #[serde(default)]
    linked_event_id: Option<String>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = Error;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let task = Task {
            id: record.id,
            title: record.title,
            duration_hours: record.duration_hours,
            scheduled_date: record.scheduled_date,
            scheduled: record.scheduled,
            linked_event_id: record.linked_event_id,
        };
        task.validate()?;
        Ok(task)
    }
}

impl Task {
    /// Create a new unscheduled task with a fresh id
    pub fn new(title: impl Into<String>, duration_hours: f64) -> DeskResult<Self> {
        let task = Self {
            id: Uuid::new_v4().to_string(),
            title: title.into().trim().to_string(),
            duration_hours,
            scheduled_date: None,
            scheduled: false,
            linked_event_id: None,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn validate(&self) -> DeskResult<()> {
        validate_id("task", &self.id)?;
        if self.title.trim().is_empty() {
            return Err(validation_error("Task title must not be empty"));
        }
        if !self.duration_hours.is_finite() || self.duration_hours <= 0.0 {
            return Err(validation_error(&format!(
                "Task duration must be a positive number of hours, got {}",
                self.duration_hours
            )));
        }
        if self.scheduled != self.linked_event_id.is_some() {
            return Err(validation_error(&format!(
                "Task {} must have a linked event exactly when it is scheduled",
                self.id
            )));
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        hours_to_duration(self.duration_hours)
    }

    pub fn mark_scheduled(&mut self, event_id: impl Into<String>, date: NaiveDate) {
        self.scheduled = true;
        self.linked_event_id = Some(event_id.into());
        self.scheduled_date = Some(date);
    }

    pub fn clear_schedule(&mut self) {
        self.scheduled = false;
        self.linked_event_id = None;
        self.scheduled_date = None;
    }
}

/// Which tasks a listing returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Scheduled,
    Unscheduled,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Scheduled => task.scheduled,
            TaskFilter::Unscheduled => !task.scheduled,
        }
    }
}
