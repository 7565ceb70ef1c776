use crate::error::{validation_error, DeskResult};
use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Resolve a wall-clock time in `tz` to an offset-carrying timestamp
pub fn localize(tz: Tz, naive: NaiveDateTime) -> DeskResult<DateTime<FixedOffset>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.fixed_offset()),
        // Fall-back transitions repeat an hour; take the first occurrence
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.fixed_offset()),
        LocalResult::None => Err(validation_error(&format!(
            "{} does not exist in {}",
            naive, tz
        ))),
    }
}

/// Midnight of `date` in `tz`
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DeskResult<DateTime<FixedOffset>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| validation_error("Failed to create datetime"))?;
    localize(tz, midnight)
}

/// Schedulable window of `date` between two HH:MM clock times
pub fn day_window(
    tz: Tz,
    date: NaiveDate,
    day_start: &str,
    day_end: &str,
) -> DeskResult<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let at = |clock: &str| -> DeskResult<DateTime<FixedOffset>> {
        let (hour, minute) = parse_time(clock)
            .ok_or_else(|| validation_error(&format!("Invalid time format: {}", clock)))?;
        let naive = date
            .and_hms_opt(hour, minute, 0)
            .ok_or_else(|| validation_error("Failed to create datetime"))?;
        localize(tz, naive)
    };

    let start = at(day_start)?;
    let end = at(day_end)?;
    if start >= end {
        return Err(validation_error("Day start must be before day end"));
    }
    Ok((start, end))
}

/// Parse user input as RFC 3339 or as `YYYY-MM-DD HH:MM` local to `tz`
pub fn parse_datetime_input(input: &str, tz: Tz) -> DeskResult<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .map_err(|e| validation_error(&format!("Invalid datetime '{}': {}", input, e)))?;
    localize(tz, naive)
}

/// Convert a fractional hour count to a duration, rounded to the millisecond
pub fn hours_to_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

/// Render a duration as `1h30m`
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{:02}m", h, m),
    }
}
