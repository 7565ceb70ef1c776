use super::{CommandContext, CommandResult};
use chrono::NaiveDate;
use lifedesk::components::free_time::TimeInterval;
use lifedesk::components::tasks::free_intervals_in;
use lifedesk::error::{validation_error, DeskResult};
use lifedesk::utils::time::{day_window, format_duration};

/// Schedulable window of `date` (today when absent) in the configured timezone
pub async fn day_interval(ctx: &CommandContext, date: Option<&str>) -> DeskResult<TimeInterval> {
    let tz = ctx.tz().await?;
    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|e| validation_error(&format!("Invalid date '{}': {}", raw, e)))?,
        None => ctx.now().await?.date_naive(),
    };

    let config = ctx.config.read().await;
    let (start, end) = day_window(tz, date, &config.day_start_time, &config.day_end_time)?;
    TimeInterval::new(start, end)
}

/// Run one synchronization pass and print what changed
pub async fn sync(ctx: &CommandContext) -> CommandResult {
    let engine = ctx.sync_engine().await?;
    let report = engine.run_once(ctx.now().await?).await?;

    if report.total() == 0 {
        println!("Calendar {} is already in sync", engine.calendar_id());
    } else {
        println!("Synchronized {}: {}", engine.calendar_id(), report);
    }
    Ok(())
}

/// Print the free intervals of a day
pub async fn free(ctx: &CommandContext, date: Option<&str>) -> CommandResult {
    let window = day_interval(ctx, date).await?;
    let events = ctx.event_store();
    let free = free_intervals_in(events.as_ref(), &window, ctx.now().await?).await?;

    if free.is_empty() {
        println!("No free time left between {} and {}", window.start, window.end);
        return Ok(());
    }

    for interval in &free {
        println!(
            "{} - {}  ({})",
            interval.start.format("%Y-%m-%d %H:%M"),
            interval.end.format("%H:%M"),
            format_duration(interval.duration())
        );
    }
    Ok(())
}
