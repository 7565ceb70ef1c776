use lifedesk::components::redis_service::{RedisActorHandle, RedisCommand};
use redis::{Arg, Cmd, ErrorKind, RedisError, RedisResult, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type Hashes = HashMap<String, HashMap<String, String>>;

/// In-memory stand-in for the Redis actor covering the hash commands.
///
/// `EVAL` is answered as a compare-and-set on one hash field:
/// `EVAL <script> 1 <key> <field> <expected> <next>`, where an empty `next` deletes.
#[derive(Clone, Default)]
pub struct FakeRedis {
    hashes: Arc<Mutex<Hashes>>,
    refused_writes: Arc<Mutex<HashSet<String>>>,
}

impl FakeRedis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an actor loop answering from memory and return its handle
    pub fn handle(&self) -> RedisActorHandle {
        let (command_tx, mut command_rx) = mpsc::channel(32);
        let fake = self.clone();

        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                match command {
                    RedisCommand::Query(cmd, response_tx) => {
                        let _ = response_tx.send(fake.answer(&cmd)).await;
                    }
                    RedisCommand::Shutdown => break,
                }
            }
        });

        RedisActorHandle::from_mailbox(command_tx)
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<String> {
        self.hashes.lock().unwrap().get(key)?.get(field).cloned()
    }

    pub fn hset(&self, key: &str, field: &str, value: &str) {
        self.hashes
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    /// Make every HSET on `key` fail until `accept_writes` is called
    pub fn refuse_writes(&self, key: &str) {
        self.refused_writes.lock().unwrap().insert(key.to_string());
    }

    pub fn accept_writes(&self, key: &str) {
        self.refused_writes.lock().unwrap().remove(key);
    }

    fn answer(&self, cmd: &Cmd) -> RedisResult<Value> {
        let args: Vec<String> = cmd
            .args_iter()
            .filter_map(|arg| match arg {
                Arg::Simple(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                Arg::Cursor => None,
            })
            .collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let mut hashes = self.hashes.lock().unwrap();

        match args.as_slice() {
            ["HGET", key, field] => Ok(hashes
                .get(*key)
                .and_then(|hash| hash.get(*field))
                .map_or(Value::Nil, |value| bulk(value))),
            ["HGETALL", key] => Ok(Value::Map(
                hashes
                    .get(*key)
                    .into_iter()
                    .flatten()
                    .map(|(field, value)| (bulk(field), bulk(value)))
                    .collect(),
            )),
            ["HSET", key, field, value] => {
                if self.refused_writes.lock().unwrap().contains(*key) {
                    return Err(RedisError::from((ErrorKind::IoError, "write refused")));
                }
                let hash = hashes.entry(key.to_string()).or_default();
                let added = hash.insert(field.to_string(), value.to_string()).is_none();
                Ok(Value::Int(added as i64))
            }
            ["HSETNX", key, field, value] => {
                let hash = hashes.entry(key.to_string()).or_default();
                if hash.contains_key(*field) {
                    return Ok(Value::Int(0));
                }
                hash.insert(field.to_string(), value.to_string());
                Ok(Value::Int(1))
            }
            ["HDEL", key, field] => {
                let removed = hashes
                    .get_mut(*key)
                    .and_then(|hash| hash.remove(*field))
                    .is_some();
                Ok(Value::Int(removed as i64))
            }
            ["EVAL", _script, "1", key, field, expected, next] => {
                let hash = hashes.entry(key.to_string()).or_default();
                if hash.get(*field).map(String::as_str) != Some(*expected) {
                    return Ok(Value::Int(0));
                }
                if next.is_empty() {
                    hash.remove(*field);
                } else {
                    hash.insert(field.to_string(), next.to_string());
                }
                Ok(Value::Int(1))
            }
            other => Err(RedisError::from((
                ErrorKind::ResponseError,
                "unsupported command",
                format!("{:?}", other),
            ))),
        }
    }
}

fn bulk(value: &str) -> Value {
    Value::BulkString(value.as_bytes().to_vec())
}
