//! Task management commands.

use super::calendar::day_interval;
use super::{CommandContext, CommandResult};
use clap::Subcommand;
use lifedesk::components::free_time::TimeInterval;
use lifedesk::components::tasks::{free_intervals_in, suggest_slots, Task, TaskFilter, TaskStore};
use lifedesk::error::{not_found, validation_error, DeskResult};
use lifedesk::utils::time::{format_duration, parse_datetime_input};
use lifedesk::utils::validate_id;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new unscheduled task
    Add {
        /// Task title
        title: String,
        /// Estimated duration in hours
        #[arg(long, default_value = "1")]
        hours: f64,
    },
    /// List tasks
    List {
        /// Only scheduled tasks
        #[arg(long, conflicts_with = "unscheduled")]
        scheduled: bool,
        /// Only unscheduled tasks
        #[arg(long)]
        unscheduled: bool,
    },
    /// Delete a task, removing its calendar event if it has one
    Remove {
        /// Task ID
        id: String,
    },
    /// Show free slots long enough for a task
    Suggest {
        /// Task ID
        id: String,
        /// Day to look at (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Book a task into free time
    Schedule {
        /// Task ID
        id: String,
        /// Day to look at (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Start time ("YYYY-MM-DD HH:MM" or RFC 3339); first fitting slot when absent
        #[arg(long)]
        at: Option<String>,
    },
    /// Remove a task from the calendar
    Unschedule {
        /// Task ID
        id: String,
    },
}

pub async fn run(ctx: &CommandContext, action: TaskAction) -> CommandResult {
    match action {
        TaskAction::Add { title, hours } => {
            let task = Task::new(title, hours)?;
            ctx.task_store().save(&task).await?;
            println!("Created task {} ({})", task.id, format_duration(task.duration()));
        }
        TaskAction::List {
            scheduled,
            unscheduled,
        } => {
            let filter = match (scheduled, unscheduled) {
                (true, _) => TaskFilter::Scheduled,
                (_, true) => TaskFilter::Unscheduled,
                _ => TaskFilter::All,
            };
            let tasks = ctx.task_store().list(filter).await?;
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in tasks {
                let when = task
                    .scheduled_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unscheduled".to_string());
                println!(
                    "{}  {:<32} {:>6}  {}",
                    task.id,
                    task.title,
                    format_duration(task.duration()),
                    when
                );
            }
        }
        TaskAction::Remove { id } => {
            let task = ctx.task_scheduler().await?.delete_task(&id).await?;
            println!("Deleted task '{}'", task.title);
        }
        TaskAction::Suggest { id, date } => {
            let (task, slots) = fitting_slots(ctx, &id, date.as_deref()).await?;
            if slots.is_empty() {
                println!("No free slot fits '{}'", task.title);
            }
            for slot in slots {
                println!("{}  ({})", slot, format_duration(slot.duration()));
            }
        }
        TaskAction::Schedule { id, date, at } => {
            let (task, slots) = fitting_slots(ctx, &id, date.as_deref()).await?;
            let slot = match at {
                Some(raw) => {
                    let start = parse_datetime_input(&raw, ctx.tz().await?)?;
                    slots
                        .iter()
                        .find(|slot| slot.start <= start && start < slot.end)
                        .map(|slot| TimeInterval::new(start, slot.end))
                        .transpose()?
                        .filter(|slot| slot.can_fit(task.duration()))
                        .ok_or_else(|| {
                            validation_error(&format!("'{}' does not fit at {}", task.title, raw))
                        })?
                }
                None => slots.first().copied().ok_or_else(|| {
                    validation_error(&format!("No free slot fits '{}'", task.title))
                })?,
            };

            let task = ctx.task_scheduler().await?.schedule_task(&task.id, &slot).await?;
            println!("Scheduled '{}' starting {}", task.title, slot.start);
        }
        TaskAction::Unschedule { id } => {
            let task = ctx.task_scheduler().await?.unschedule_task(&id).await?;
            println!("'{}' is no longer scheduled", task.title);
        }
    }
    Ok(())
}

async fn fitting_slots(
    ctx: &CommandContext,
    id: &str,
    date: Option<&str>,
) -> DeskResult<(Task, Vec<TimeInterval>)> {
    validate_id("task", id)?;
    let task = ctx
        .task_store()
        .get(id)
        .await?
        .ok_or_else(|| not_found("task", id))?;

    let window = day_interval(ctx, date).await?;
    let events = ctx.event_store();
    let free = free_intervals_in(events.as_ref(), &window, ctx.now().await?).await?;
    let slots = suggest_slots(&task, &free);
    Ok((task, slots))
}
