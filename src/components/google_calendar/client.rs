use super::models::{GoogleEvent, GoogleEventList};
use super::time::{to_calendar_event, to_google_event};
use super::token::Credential;
use super::CalendarProvider;
use crate::components::event_store::CalendarEvent;
use crate::error::{adapter_error, config_error, DeskResult};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

/// Calendar API v3 client
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: Url,
    credential: Credential,
    timezone: Tz,
}

impl GoogleCalendarClient {
    /// Create a client for `base_url` using an already obtained credential
    pub fn new(base_url: &str, credential: Credential, timezone: Tz) -> DeskResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| config_error(&format!("Invalid calendar API URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(config_error(&format!("Calendar API URL {} cannot be a base", base_url)));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            credential,
            timezone,
        })
    }

    /// `{base}/calendars/{calendar_id}/events[/{event_id}]`, segments escaped
    fn events_url(&self, calendar_id: &str, event_id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["calendars", calendar_id, "events"]);
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }
        url
    }

    /// Fail with the response body when the status is not a success
    async fn ensure_success(response: Response, operation: &str, target: &str) -> DeskResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        Err(adapter_error(
            operation,
            target,
            format!("HTTP {} - {}", status, error_body),
        ))
    }

    async fn send_event(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
        target: &str,
    ) -> DeskResult<CalendarEvent> {
        let response = request
            .bearer_auth(self.credential.access_token())
            .send()
            .await
            .map_err(|e| adapter_error(operation, target, e))?;

        let created: GoogleEvent = Self::ensure_success(response, operation, target)
            .await?
            .json()
            .await
            .map_err(|e| adapter_error(operation, target, format!("Failed to parse response: {}", e)))?;

        to_calendar_event(&created, self.timezone)
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> DeskResult<Vec<CalendarEvent>> {
        let operation = "google.list_events";
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.events_url(calendar_id, None);
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("timeMin", &start.to_rfc3339())
                    .append_pair("timeMax", &end.to_rfc3339())
                    .append_pair("singleEvents", "true")
                    .append_pair("orderBy", "startTime")
                    .append_pair("maxResults", "250");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self
                .client
                .get(url)
                .bearer_auth(self.credential.access_token())
                .send()
                .await
                .map_err(|e| adapter_error(operation, calendar_id, e))?;

            let page: GoogleEventList = Self::ensure_success(response, operation, calendar_id)
                .await?
                .json()
                .await
                .map_err(|e| {
                    adapter_error(operation, calendar_id, format!("Failed to parse events response: {}", e))
                })?;

            for item in &page.items {
                if item.is_cancelled() {
                    continue;
                }
                match to_calendar_event(item, self.timezone) {
                    Ok(event) => events.push(event),
                    Err(e) => warn!(
                        "Skipping provider event {}: {}",
                        item.id.as_deref().unwrap_or("<no id>"),
                        e
                    ),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Fetched {} events from calendar {}", events.len(), calendar_id);
        Ok(events)
    }

    async fn create_event(&self, calendar_id: &str, event: &CalendarEvent) -> DeskResult<CalendarEvent> {
        let url = self.events_url(calendar_id, None);
        let request = self.client.post(url).json(&to_google_event(event));
        self.send_event(request, "google.create_event", event.label()).await
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        external_id: &str,
        event: &CalendarEvent,
    ) -> DeskResult<CalendarEvent> {
        let url = self.events_url(calendar_id, Some(external_id));
        let request = self.client.put(url).json(&to_google_event(event));
        self.send_event(request, "google.update_event", external_id).await
    }

    async fn delete_event(&self, calendar_id: &str, external_id: &str) -> DeskResult<()> {
        let operation = "google.delete_event";
        let url = self.events_url(calendar_id, Some(external_id));

        let response = self
            .client
            .delete(url)
            .bearer_auth(self.credential.access_token())
            .send()
            .await
            .map_err(|e| adapter_error(operation, external_id, e))?;

        // Already gone counts as deleted
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            debug!("Event {} was already deleted", external_id);
            return Ok(());
        }

        Self::ensure_success(response, operation, external_id).await?;
        Ok(())
    }
}
