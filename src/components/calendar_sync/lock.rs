use crate::components::redis_service::{keys, RedisActorHandle};
use crate::error::{adapter_error, DeskResult};
use async_trait::async_trait;
use uuid::Uuid;

/// Proof of holding the sync lock for one calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    pub calendar_id: String,
    pub token: String,
}

/// Advisory lock keeping sync passes for one calendar from overlapping
#[async_trait]
pub trait SyncLock: Send + Sync {
    /// Take the lock, or `None` when another pass holds it
    async fn acquire(&self, calendar_id: &str) -> DeskResult<Option<LockLease>>;

    /// Give the lock back; a lease that already expired is ignored
    async fn release(&self, lease: LockLease) -> DeskResult<()>;
}

// Deletes the key only while it still holds our token
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Redis `SET NX EX` lock with token-checked release
pub struct RedisSyncLock {
    redis: RedisActorHandle,
    ttl_secs: u64,
}

impl RedisSyncLock {
    pub fn new(redis: RedisActorHandle, ttl_secs: u64) -> Self {
        Self {
            redis,
            ttl_secs: ttl_secs.max(1),
        }
    }

    fn key(calendar_id: &str) -> String {
        format!("{}{}", keys::SYNC_LOCK_PREFIX, calendar_id)
    }
}

#[async_trait]
impl SyncLock for RedisSyncLock {
    async fn acquire(&self, calendar_id: &str) -> DeskResult<Option<LockLease>> {
        let token = Uuid::new_v4().to_string();
        let mut cmd = redis::cmd("SET");
        cmd.arg(Self::key(calendar_id))
            .arg(&token)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs);

        let reply: Option<String> = self
            .redis
            .query(cmd)
            .await
            .map_err(|e| adapter_error("sync_lock.acquire", calendar_id, e))?;

        Ok(reply.map(|_| LockLease {
            calendar_id: calendar_id.to_string(),
            token,
        }))
    }

    async fn release(&self, lease: LockLease) -> DeskResult<()> {
        let mut cmd = redis::cmd("EVAL");
        cmd.arg(RELEASE_SCRIPT)
            .arg(1)
            .arg(Self::key(&lease.calendar_id))
            .arg(&lease.token);

        self.redis
            .query::<i64>(cmd)
            .await
            .map_err(|e| adapter_error("sync_lock.release", &lease.calendar_id, e))?;
        Ok(())
    }
}
