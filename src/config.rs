use crate::error::{config_error, env_error, DeskResult};
use crate::utils::time::parse_time;
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Default Google Calendar API base URL
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Default Redis URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Longest look-ahead a sync pass accepts
pub const MAX_SYNC_WINDOW_DAYS: i64 = 366;

/// Where component toggles are read from
pub const COMPONENTS_FILE: &str = "config/components.toml";

/// Main configuration structure for the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google Calendar ID to keep in sync
    pub google_calendar_id: String,
    /// Base URL of the Calendar API
    pub google_api_base: String,
    /// Access token that overrides the one stored in Redis
    pub google_access_token: Option<String>,
    /// Redis connection URL
    pub redis_url: String,
    /// Timezone for day windows and all-day events
    pub timezone: String,
    /// How many days ahead a sync pass looks
    pub sync_window_days: i64,
    /// Seconds between sync passes in watch mode
    pub sync_interval_secs: u64,
    /// Lifetime of the sync lock in seconds
    pub sync_lock_ttl_secs: u64,
    /// Start of the schedulable day (HH:MM)
    pub day_start_time: String,
    /// End of the schedulable day (HH:MM)
    pub day_end_time: String,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> DeskResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_vars(|key| env::var(key).ok())?;

        if let Ok(content) = fs::read_to_string(COMPONENTS_FILE) {
            config.merge_components(&content)?;
        }

        Ok(config)
    }

    /// Build configuration from a variable lookup
    pub fn from_vars<F>(lookup: F) -> DeskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let google_calendar_id =
            lookup("GOOGLE_CALENDAR_ID").ok_or_else(|| env_error("GOOGLE_CALENDAR_ID"))?;
        if google_calendar_id.trim().is_empty() {
            return Err(config_error("GOOGLE_CALENDAR_ID must not be empty"));
        }

        let google_api_base = lookup("GOOGLE_CALENDAR_API_BASE")
            .unwrap_or_else(|| DEFAULT_CALENDAR_API_BASE.to_string());
        let google_access_token = lookup("GOOGLE_ACCESS_TOKEN").filter(|t| !t.trim().is_empty());
        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let timezone = lookup("TIMEZONE").unwrap_or_else(|| String::from("UTC"));
        if timezone.parse::<Tz>().is_err() {
            return Err(config_error(&format!("Unknown timezone: {}", timezone)));
        }

        let sync_window_days = parse_number(&lookup, "SYNC_WINDOW_DAYS", 28)?;
        if !(1..=MAX_SYNC_WINDOW_DAYS).contains(&sync_window_days) {
            return Err(config_error(&format!(
                "SYNC_WINDOW_DAYS must be between 1 and {}",
                MAX_SYNC_WINDOW_DAYS
            )));
        }
        let sync_interval_secs = parse_number(&lookup, "SYNC_INTERVAL_SECS", 300)?;
        let sync_lock_ttl_secs = parse_number(&lookup, "SYNC_LOCK_TTL_SECS", 120)?;

        let day_start_time = lookup("DAY_START_TIME").unwrap_or_else(|| String::from("08:00"));
        let day_end_time = lookup("DAY_END_TIME").unwrap_or_else(|| String::from("22:00"));
        match (parse_time(&day_start_time), parse_time(&day_end_time)) {
            (Some(start), Some(end)) if start < end => {}
            (Some(_), Some(_)) => {
                return Err(config_error("DAY_START_TIME must be before DAY_END_TIME"));
            }
            _ => return Err(config_error("Day bounds must use the HH:MM format")),
        }

        let mut components = HashMap::new();
        components.insert("calendar_sync".to_string(), true);

        Ok(Config {
            google_calendar_id,
            google_api_base,
            google_access_token,
            redis_url,
            timezone,
            sync_window_days,
            sync_interval_secs,
            sync_lock_ttl_secs,
            day_start_time,
            day_end_time,
            components,
        })
    }

    /// Merge component toggles from TOML content
    pub fn merge_components(&mut self, content: &str) -> DeskResult<()> {
        let file_components = toml::from_str::<HashMap<String, bool>>(content)?;
        for (key, value) in file_components {
            self.components.insert(key, value);
        }
        Ok(())
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }

    /// Parsed timezone
    pub fn tz(&self) -> DeskResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }

    /// Load component toggles from a specific file
    pub fn load_components_from(&mut self, path: &Path) -> DeskResult<()> {
        let content = fs::read_to_string(path)?;
        self.merge_components(&content)
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> DeskResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} value: {}", key, raw))),
        None => Ok(default),
    }
}
