use super::actor::RedisActorHandle;
use crate::error::{adapter_error, DeskResult, Error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;

/// JSON records stored in one Redis hash, keyed by record id
pub struct RedisCollection<T> {
    redis: RedisActorHandle,
    key: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> RedisCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(redis: RedisActorHandle, key: impl Into<String>) -> Self {
        Self {
            redis,
            key: key.into(),
            _record: PhantomData,
        }
    }

    /// The underlying Redis handle
    pub fn redis(&self) -> &RedisActorHandle {
        &self.redis
    }

    pub async fn get(&self, id: &str) -> DeskResult<Option<T>> {
        let mut cmd = redis::cmd("HGET");
        cmd.arg(&self.key).arg(id);

        let raw: Option<String> = self
            .redis
            .query(cmd)
            .await
            .map_err(|e| adapter_error("redis.hget", id, e))?;

        raw.map(|json| self.decode(id, &json)).transpose()
    }

    pub async fn all(&self) -> DeskResult<Vec<T>> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(&self.key);

        let entries: HashMap<String, String> = self
            .redis
            .query(cmd)
            .await
            .map_err(|e| adapter_error("redis.hgetall", &self.key, e))?;

        entries
            .iter()
            .map(|(id, json)| self.decode(id, json))
            .collect()
    }

    pub async fn put(&self, id: &str, record: &T) -> DeskResult<()> {
        let json = serde_json::to_string(record)?;
        let mut cmd = redis::cmd("HSET");
        cmd.arg(&self.key).arg(id).arg(json);

        self.redis
            .query::<()>(cmd)
            .await
            .map_err(|e| adapter_error("redis.hset", id, e))
    }

    /// Remove a record; returns whether it existed
    pub async fn remove(&self, id: &str) -> DeskResult<bool> {
        let mut cmd = redis::cmd("HDEL");
        cmd.arg(&self.key).arg(id);

        let removed: i64 = self
            .redis
            .query(cmd)
            .await
            .map_err(|e| adapter_error("redis.hdel", id, e))?;

        Ok(removed > 0)
    }

    fn decode(&self, id: &str, json: &str) -> DeskResult<T> {
        serde_json::from_str(json).map_err(|e| {
            Error::Serialization(format!("Record `{}` in {} is invalid: {}", id, self.key, e))
        })
    }
}
