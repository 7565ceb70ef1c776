mod mocks;

use lifedesk::components::calendar_sync::SyncEngine;
use lifedesk::components::event_store::EventStore;
use lifedesk::error::Error;
use mocks::{at, event, MemoryEventStore, MockCalendarProvider, MockLock, ProviderCall};
use std::sync::atomic::Ordering;
use std::sync::Arc;

struct Fixture {
    provider: Arc<MockCalendarProvider>,
    store: Arc<MemoryEventStore>,
    lock: Arc<MockLock>,
    engine: SyncEngine,
}

fn fixture(lock: MockLock) -> Fixture {
    fixture_with_window(lock, 28)
}

fn fixture_with_window(lock: MockLock, window_days: i64) -> Fixture {
    let provider = Arc::new(MockCalendarProvider::new());
    let store = Arc::new(MemoryEventStore::new());
    let lock = Arc::new(lock);
    let engine = SyncEngine::new(
        "primary",
        window_days,
        provider.clone(),
        store.clone(),
        lock.clone(),
    );
    Fixture {
        provider,
        store,
        lock,
        engine,
    }
}

/// A remote-only event is copied locally and a dropped remote copy is re-created
#[tokio::test]
async fn test_sync_creates_both_directions() {
    let f = fixture(MockLock::free());
    f.provider.seed("r1", event("Dentist", 9, 10));
    let kept_id = f.store.seed(event("Gym", 18, 19).with_external_id("deleted-remotely"));

    let report = f.engine.run_once(at(6, 0)).await.unwrap();

    assert_eq!(report.created_local, 1);
    assert_eq!(report.created_remote, 1);
    assert_eq!(report.linked_local, 1);
    assert_eq!(report.updated_local, 0);

    let stored = f.store.snapshot();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].title, "Dentist");
    assert_eq!(stored[0].external_id.as_deref(), Some("r1"));

    let relinked = f.store.get(&kept_id).unwrap();
    let new_external = relinked.external_id.clone().unwrap();
    assert_ne!(new_external, "deleted-remotely");
    assert!(f
        .provider
        .remote_events()
        .iter()
        .any(|e| e.external_id.as_deref() == Some(new_external.as_str()) && e.title == "Gym"));
    assert_eq!(f.lock.releases.load(Ordering::SeqCst), 1);
}

/// Running again right after a pass changes nothing
#[tokio::test]
async fn test_second_pass_is_a_no_op() {
    let f = fixture(MockLock::free());
    f.provider.seed("r1", event("Dentist", 9, 10));
    f.store.seed(event("Gym", 18, 19).with_external_id("deleted-remotely"));

    f.engine.run_once(at(6, 0)).await.unwrap();
    let before = f.store.snapshot();
    f.provider.clear_calls();

    let report = f.engine.run_once(at(6, 0)).await.unwrap();

    assert_eq!(report.total(), 0);
    assert_eq!(f.store.snapshot(), before);
    assert_eq!(f.provider.calls(), vec![ProviderCall::List]);
}

/// Remote content wins over the local copy
#[tokio::test]
async fn test_remote_changes_update_local() {
    let f = fixture(MockLock::free());
    f.provider
        .seed("r1", event("Team lunch", 12, 13).with_description("Bring slides"));
    let id = f.store.seed(event("Lunch", 12, 13).with_external_id("r1"));

    let report = f.engine.run_once(at(6, 0)).await.unwrap();

    assert_eq!(report.updated_local, 1);
    assert_eq!(report.created_local, 0);
    let updated = f.store.get(&id).unwrap();
    assert_eq!(updated.title, "Team lunch");
    assert_eq!(updated.description.as_deref(), Some("Bring slides"));
    assert_eq!(updated.external_id.as_deref(), Some("r1"));
}

/// Unlinked local events are never pushed to the provider
#[tokio::test]
async fn test_unlinked_local_events_stay_local() {
    let f = fixture(MockLock::free());
    f.store.seed(event("Private note", 9, 10));

    let report = f.engine.run_once(at(6, 0)).await.unwrap();

    assert_eq!(report.total(), 0);
    assert!(f.provider.remote_events().is_empty());
}

/// A held lock stops the pass before any provider call
#[tokio::test]
async fn test_held_lock_is_a_conflict() {
    let f = fixture(MockLock::held());
    f.provider.seed("r1", event("Dentist", 9, 10));

    let err = f.engine.run_once(at(6, 0)).await.unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    assert!(f.provider.calls().is_empty());
    assert!(f.store.snapshot().is_empty());
}

/// The first failing operation ends the pass; earlier work is kept
#[tokio::test]
async fn test_failure_aborts_pass_without_rollback() {
    let f = fixture(MockLock::free());
    f.provider.seed("r1", event("Dentist", 9, 10));
    let kept_id = f.store.seed(event("Gym", 18, 19).with_external_id("deleted-remotely"));
    *f.provider.fail_creates.lock().unwrap() = true;

    let err = f.engine.run_once(at(6, 0)).await.unwrap_err();

    assert!(matches!(err, Error::Adapter { .. }));
    let copied = f
        .store
        .find(&lifedesk::components::event_store::EventQuery::by_external_id("r1"))
        .await
        .unwrap();
    assert_eq!(copied.len(), 1);
    assert_eq!(
        f.store.get(&kept_id).unwrap().external_id.as_deref(),
        Some("deleted-remotely")
    );
    assert_eq!(f.lock.releases.load(Ordering::SeqCst), 1);
}

/// Events outside the sync window are ignored on both sides
#[tokio::test]
async fn test_events_before_window_are_ignored() {
    let f = fixture(MockLock::free());
    f.provider.seed("r-early", event("Breakfast", 7, 8));
    f.store.seed(event("Early run", 6, 7).with_external_id("gone"));

    let report = f.engine.run_once(at(9, 0)).await.unwrap();

    assert_eq!(report.total(), 0);
}

/// A window running past the last representable date is refused, not a panic
#[tokio::test]
async fn test_oversized_window_is_rejected() {
    for days in [100_000_000, 1_000_000_000_000, 0] {
        let f = fixture_with_window(MockLock::free(), days);

        let err = f.engine.run_once(at(6, 0)).await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)), "{} days", days);
        assert!(f.provider.calls().is_empty());
        assert_eq!(f.lock.releases.load(Ordering::SeqCst), 0);
    }
}
