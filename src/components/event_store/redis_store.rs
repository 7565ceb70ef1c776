use super::models::{CalendarEvent, EventPatch, EventQuery};
use super::EventStore;
use crate::components::redis_service::{keys, RedisActorHandle, RedisCollection};
use crate::error::{adapter_error, conflict_error, not_found, DeskResult};
use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

// Compare-and-set on one index field; an empty new owner deletes the field
const SWAP_OWNER_SCRIPT: &str = r#"
if redis.call("HGET", KEYS[1], ARGV[1]) ~= ARGV[2] then
    return 0
end
if ARGV[3] == "" then
    return redis.call("HDEL", KEYS[1], ARGV[1])
end
redis.call("HSET", KEYS[1], ARGV[1], ARGV[3])
return 1
"#;

/// Event store backed by a Redis hash plus an external id index
pub struct RedisEventStore {
    events: RedisCollection<CalendarEvent>,
}

impl RedisEventStore {
    pub fn new(redis: RedisActorHandle) -> Self {
        Self {
            events: RedisCollection::new(redis, keys::EVENTS),
        }
    }

    fn redis(&self) -> &RedisActorHandle {
        self.events.redis()
    }

    /// Internal id currently holding `external_id`
    async fn owner_of(&self, external_id: &str) -> DeskResult<Option<String>> {
        let mut cmd = redis::cmd("HGET");
        cmd.arg(keys::EVENTS_BY_EXTERNAL_ID).arg(external_id);

        self.redis()
            .query(cmd)
            .await
            .map_err(|e| adapter_error("event_store.lookup_external_id", external_id, e))
    }

    /// Claim `external_id` for `internal_id` unless another live record holds it
    async fn claim_external_id(&self, external_id: &str, internal_id: &str) -> DeskResult<()> {
        // A second attempt covers a release racing between HSETNX and HGET
        for _ in 0..2 {
            let mut cmd = redis::cmd("HSETNX");
            cmd.arg(keys::EVENTS_BY_EXTERNAL_ID)
                .arg(external_id)
                .arg(internal_id);

            let claimed: bool = self
                .redis()
                .query(cmd)
                .await
                .map_err(|e| adapter_error("event_store.claim_external_id", external_id, e))?;

            if claimed {
                return Ok(());
            }

            let owner = match self.owner_of(external_id).await? {
                Some(owner) if owner == internal_id => return Ok(()),
                Some(owner) => owner,
                None => continue,
            };

            if self.holds_external_id(&owner, external_id).await? {
                return Err(conflict_error(&format!(
                    "External id {} is already linked to event {}",
                    external_id, owner
                )));
            }

            // The owner never stored its record or has since moved to another id
            if self
                .swap_owner(external_id, &owner, Some(internal_id))
                .await?
            {
                warn!(
                    "Took over external id {} from stale index entry {}",
                    external_id, owner
                );
                return Ok(());
            }
        }

        Err(conflict_error(&format!(
            "External id {} changed owner while being claimed",
            external_id
        )))
    }

    /// Whether the stored record `owner` still carries `external_id`
    async fn holds_external_id(&self, owner: &str, external_id: &str) -> DeskResult<bool> {
        let record = self.events.get(owner).await?;
        Ok(record.is_some_and(|event| event.external_id.as_deref() == Some(external_id)))
    }

    /// Move the index entry from `expected` to `next`, or drop it when `next` is `None`.
    /// Returns false when someone else owns the entry by now.
    async fn swap_owner(
        &self,
        external_id: &str,
        expected: &str,
        next: Option<&str>,
    ) -> DeskResult<bool> {
        let mut cmd = redis::cmd("EVAL");
        cmd.arg(SWAP_OWNER_SCRIPT)
            .arg(1)
            .arg(keys::EVENTS_BY_EXTERNAL_ID)
            .arg(external_id)
            .arg(expected)
            .arg(next.unwrap_or(""));

        let swapped: i64 = self
            .redis()
            .query(cmd)
            .await
            .map_err(|e| adapter_error("event_store.swap_external_id", external_id, e))?;
        Ok(swapped > 0)
    }

    /// Drop the index entry if `internal_id` still owns it
    async fn release_external_id(&self, external_id: &str, internal_id: &str) -> DeskResult<()> {
        self.swap_owner(external_id, internal_id, None).await?;
        Ok(())
    }

    /// Undo a claim after the record write failed
    async fn abandon_claim(&self, external_id: &str, internal_id: &str) {
        if let Err(e) = self.release_external_id(external_id, internal_id).await {
            warn!(
                "Could not release external id {} after a failed write: {}",
                external_id, e
            );
        }
    }
}

#[async_trait]
impl EventStore for RedisEventStore {
    async fn insert(&self, event: CalendarEvent) -> DeskResult<String> {
        event.validate()?;
        let internal_id = Uuid::new_v4().to_string();

        if let Some(external_id) = &event.external_id {
            self.claim_external_id(external_id, &internal_id).await?;
        }

        let record = event.with_internal_id(internal_id.clone());
        if let Err(e) = self.events.put(&internal_id, &record).await {
            if let Some(external_id) = &record.external_id {
                self.abandon_claim(external_id, &internal_id).await;
            }
            return Err(e);
        }

        debug!("Stored event {} ({})", internal_id, record.title);
        Ok(internal_id)
    }

    async fn find(&self, query: &EventQuery) -> DeskResult<Vec<CalendarEvent>> {
        let candidates = if let Some(internal_id) = &query.internal_id {
            self.events.get(internal_id).await?.into_iter().collect()
        } else if let Some(external_id) = &query.external_id {
            match self.owner_of(external_id).await? {
                Some(owner) => self.events.get(&owner).await?.into_iter().collect(),
                None => Vec::new(),
            }
        } else {
            self.events.all().await?
        };

        let mut matches: Vec<CalendarEvent> = candidates
            .into_iter()
            .filter(|event| query.matches(event))
            .collect();
        matches.sort_by_key(|event| event.start_time);
        Ok(matches)
    }

    async fn update(&self, internal_id: &str, patch: EventPatch) -> DeskResult<()> {
        let existing = self
            .events
            .get(internal_id)
            .await?
            .ok_or_else(|| not_found("event", internal_id))?;

        let patched = patch.apply(&existing)?;

        let relinked = patched.external_id != existing.external_id;
        if relinked {
            if let Some(external_id) = &patched.external_id {
                self.claim_external_id(external_id, internal_id).await?;
            }
        }

        if let Err(e) = self.events.put(internal_id, &patched).await {
            if let (true, Some(external_id)) = (relinked, &patched.external_id) {
                self.abandon_claim(external_id, internal_id).await;
            }
            return Err(e);
        }

        if relinked {
            if let Some(previous) = &existing.external_id {
                self.release_external_id(previous, internal_id).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, internal_id: &str) -> DeskResult<()> {
        let existing = self
            .events
            .get(internal_id)
            .await?
            .ok_or_else(|| not_found("event", internal_id))?;

        self.events.remove(internal_id).await?;

        if let Some(external_id) = &existing.external_id {
            self.release_external_id(external_id, internal_id).await?;
        }

        debug!("Deleted event {}", internal_id);
        Ok(())
    }
}
