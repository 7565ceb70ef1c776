use chrono::{FixedOffset, TimeZone};
use lifedesk::components::event_store::CalendarEvent;
use lifedesk::components::google_calendar::{CalendarProvider, Credential, GoogleCalendarClient};
use lifedesk::error::Error;
use mockito::{Matcher, Server};

fn client(server: &Server) -> GoogleCalendarClient {
    let credential = Credential::bearer("test-token").unwrap();
    GoogleCalendarClient::new(&server.url(), credential, chrono_tz::Europe::Helsinki).unwrap()
}

fn window() -> (chrono::DateTime<FixedOffset>, chrono::DateTime<FixedOffset>) {
    let offset = FixedOffset::east_opt(3 * 3600).unwrap();
    (
        offset.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        offset.with_ymd_and_hms(2024, 6, 29, 0, 0, 0).unwrap(),
    )
}

/// Listing follows page tokens and drops cancelled or malformed events
#[tokio::test]
async fn test_list_events_pages_and_filters() {
    let mut server = Server::new_async().await;

    let first_page = server
        .mock("GET", "/calendars/primary/events")
        .match_header("authorization", "Bearer test-token")
        .match_query(Matcher::Regex("maxResults=250$".to_string()))
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "items": [
                    {"id": "a1", "summary": "Dentist",
                     "start": {"dateTime": "2024-06-03T09:00:00+03:00"},
                     "end": {"dateTime": "2024-06-03T10:00:00+03:00"}},
                    {"id": "a2", "status": "cancelled"}
                ],
                "nextPageToken": "p2"
            }"#,
        )
        .create_async()
        .await;

    let second_page = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::UrlEncoded("pageToken".to_string(), "p2".to_string()))
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "items": [
                    {"id": "b1",
                     "start": {"date": "2024-06-05"},
                     "end": {"date": "2024-06-06"}},
                    {"id": "b2", "summary": "Broken",
                     "start": {"dateTime": "2024-06-07T12:00:00+03:00"},
                     "end": {"dateTime": "2024-06-07T11:00:00+03:00"}}
                ]
            }"#,
        )
        .create_async()
        .await;

    let (start, end) = window();
    let events = client(&server).list_events("primary", start, end).await.unwrap();

    first_page.assert_async().await;
    second_page.assert_async().await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].external_id.as_deref(), Some("a1"));
    assert_eq!(events[0].title, "Dentist");
    assert_eq!(events[1].external_id.as_deref(), Some("b1"));
    assert_eq!(events[1].title, "(no title)");
    assert_eq!(events[1].start_time.to_rfc3339(), "2024-06-05T00:00:00+03:00");
}

/// Creating an event posts the payload and returns the provider id
#[tokio::test]
async fn test_create_event_returns_provider_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/calendars/primary/events")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJsonString(
            r#"{"summary": "Write report", "description": "task:t1"}"#.to_string(),
        ))
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"id": "new-1", "summary": "Write report", "description": "task:t1",
                "start": {"dateTime": "2024-06-03T09:00:00+03:00"},
                "end": {"dateTime": "2024-06-03T11:00:00+03:00"}}"#,
        )
        .create_async()
        .await;

    let (start, _) = window();
    let event = CalendarEvent::new(
        "Write report",
        start + chrono::Duration::hours(57),
        start + chrono::Duration::hours(59),
    )
    .unwrap()
    .with_description("task:t1");

    let created = client(&server).create_event("primary", &event).await.unwrap();

    mock.assert_async().await;
    assert_eq!(created.external_id.as_deref(), Some("new-1"));
    assert_eq!(created.start_time, event.start_time);
    assert!(created.internal_id.is_none());
}

/// A missing event counts as already deleted
#[tokio::test]
async fn test_delete_missing_event_is_ok() {
    let mut server = Server::new_async().await;
    let gone = server
        .mock("DELETE", "/calendars/primary/events/old-1")
        .with_status(410)
        .create_async()
        .await;
    let missing = server
        .mock("DELETE", "/calendars/primary/events/old-2")
        .with_status(404)
        .create_async()
        .await;

    let client = client(&server);
    assert!(client.delete_event("primary", "old-1").await.is_ok());
    assert!(client.delete_event("primary", "old-2").await.is_ok());

    gone.assert_async().await;
    missing.assert_async().await;
}

/// Error statuses surface as adapter errors carrying the status
#[tokio::test]
async fn test_error_status_is_an_adapter_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("invalid credentials")
        .create_async()
        .await;

    let (start, end) = window();
    let err = client(&server).list_events("primary", start, end).await.unwrap_err();

    match err {
        Error::Adapter { operation, message, .. } => {
            assert_eq!(operation, "google.list_events");
            assert!(message.contains("401"));
            assert!(message.contains("invalid credentials"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Deleting fails loudly on server errors
#[tokio::test]
async fn test_delete_server_error_fails() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/calendars/primary/events/e1")
        .with_status(500)
        .create_async()
        .await;

    let err = client(&server).delete_event("primary", "e1").await.unwrap_err();
    assert!(matches!(err, Error::Adapter { .. }));
}

/// Updating replaces the provider copy with a PUT and returns the stored version
#[tokio::test]
async fn test_update_event_puts_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/calendars/primary/events/ev-1")
        .match_header("authorization", "Bearer test-token")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJsonString(
            r#"{"summary": "Team lunch", "description": "Bring slides",
                "start": {"dateTime": "2024-06-03T12:00:00+03:00"}}"#
                .to_string(),
        ))
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"id": "ev-1", "summary": "Team lunch", "description": "Bring slides",
                "start": {"dateTime": "2024-06-03T12:00:00+03:00"},
                "end": {"dateTime": "2024-06-03T13:30:00+03:00"}}"#,
        )
        .create_async()
        .await;

    let (start, _) = window();
    let event = CalendarEvent::new(
        "Team lunch",
        start + chrono::Duration::hours(60),
        start + chrono::Duration::minutes(60 * 61 + 30),
    )
    .unwrap()
    .with_description("Bring slides");

    let updated = client(&server)
        .update_event("primary", "ev-1", &event)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(updated.external_id.as_deref(), Some("ev-1"));
    assert_eq!(updated.title, "Team lunch");
    assert_eq!(updated.description.as_deref(), Some("Bring slides"));
    assert_eq!(updated.start_time, event.start_time);
    assert_eq!(updated.end_time, event.end_time);
}

/// A rejected update surfaces as an adapter error naming the operation
#[tokio::test]
async fn test_update_event_error_is_reported() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("PUT", "/calendars/primary/events/ev-9")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let (start, _) = window();
    let event = CalendarEvent::new("Gone", start, start + chrono::Duration::hours(1)).unwrap();
    let err = client(&server)
        .update_event("primary", "ev-9", &event)
        .await
        .unwrap_err();

    match err {
        Error::Adapter { operation, .. } => assert_eq!(operation, "google.update_event"),
        other => panic!("unexpected error: {other:?}"),
    }
}
